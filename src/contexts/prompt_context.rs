use crate::data::RepositoryIndex;

use super::template_selector::first_lines;

const MAX_SNIPPETS: usize = 2;
const SNIPPET_LINES: usize = 80;

/// Renders what the index knows about a repository as a prompt fragment.
///
/// Templates are embedded in fenced blocks under headings that ask the model to follow them.
pub fn render_repository_context(index: &RepositoryIndex) -> String {
    let mut parts = Vec::new();

    parts.push("Project structure:".to_string());
    parts.push(format!(
        "- Test directories: {}",
        index.structure.test_directories.len()
    ));
    parts.push(format!(
        "- Page object directories: {}",
        index.structure.component_directories.len()
    ));

    let naming = &index.naming_patterns;
    parts.push("\nNaming patterns:".to_string());
    parts.push(format!("- Files: {}", naming.file_naming));
    parts.push(format!("- Classes: {}", naming.class_naming));
    parts.push(format!("- Functions: {}", naming.function_naming));
    parts.push(format!("- Test prefix: {}", naming.test_prefix));
    parts.push(format!("- Page object suffix: {}", naming.component_suffix));

    let code = &index.code_patterns;
    parts.push("\nCode patterns:".to_string());
    parts.push(format!("- Uses UI helper library: {}", code.uses_ui_helpers));
    parts.push(format!("- Uses reporting annotations: {}", code.uses_reporting));
    if let Some(base) = &code.base_component_type {
        parts.push(format!("- Base page class: {}", base));
    }
    if let Some(launcher) = &code.browser_launcher {
        parts.push(format!("- Browser launcher: {}", launcher));
    }
    if !code.common_imports.is_empty() {
        parts.push(format!("- Common imports: {}", code.common_imports.join(", ")));
    }

    let templates = &index.templates;
    if let Some(template) = &templates.component_template {
        parts.push("\n=== PAGE OBJECT TEMPLATE (FOLLOW THIS FORMAT) ===".to_string());
        push_fenced(&mut parts, template);
    }
    if let Some(template) = &templates.test_template {
        parts.push("\n=== TEST TEMPLATE (FOLLOW THIS FORMAT) ===".to_string());
        push_fenced(&mut parts, template);
    }

    if !templates.snippets.is_empty() {
        parts.push("\n=== ADDITIONAL EXAMPLES ===".to_string());
        for (i, snippet) in templates.snippets.iter().take(MAX_SNIPPETS).enumerate() {
            parts.push(format!("\nExample {}:", i + 1));
            push_fenced(&mut parts, &first_lines(snippet, SNIPPET_LINES));
        }
    }

    parts.join("\n")
}

fn push_fenced(parts: &mut Vec<String>, code: &str) {
    parts.push("```python".to_string());
    parts.push(code.to_string());
    parts.push("```".to_string());
}
