use std::path::Path;

use crate::config::ClassificationRules;
use crate::data::Category;

/// Assigns a [`Category`] to a file from its path and contents alone.
///
/// Rules are tried in order and the first match wins:
/// 1. test-like file name
/// 2. page object directory plus a recognised base class in the content
/// 3. fixture file name
/// 4. known configuration file name
#[derive(Debug, Clone, Default)]
pub struct FileClassifier {
    rules: ClassificationRules,
}

impl FileClassifier {
    pub fn new(rules: ClassificationRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &ClassificationRules {
        &self.rules
    }

    pub fn classify(&self, path: &Path, content: &str) -> Category {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        if self.is_test_name(&name) {
            return Category::Test;
        }

        if self.in_component_dir(path) && self.references_base_type(content) {
            return Category::ReusableComponent;
        }

        if name == self.rules.fixture_file_name.to_lowercase()
            || contains_any(&name, &self.rules.fixture_name_substrings)
        {
            return Category::Fixture;
        }

        if self
            .rules
            .config_file_names
            .iter()
            .any(|c| c.to_lowercase() == name)
        {
            return Category::Configuration;
        }

        Category::Other
    }

    fn is_test_name(&self, name: &str) -> bool {
        self.rules
            .test_name_prefixes
            .iter()
            .any(|p| name.starts_with(&p.to_lowercase()))
            || contains_any(name, &self.rules.test_name_substrings)
    }

    fn in_component_dir(&self, path: &Path) -> bool {
        let Some(parent) = path.parent() else {
            return false;
        };
        parent.components().any(|component| {
            let segment = component.as_os_str().to_string_lossy().to_lowercase();
            contains_any(&segment, &self.rules.component_dir_hints)
        })
    }

    fn references_base_type(&self, content: &str) -> bool {
        content.contains("class ")
            && self
                .rules
                .component_base_types
                .iter()
                .any(|base| content.contains(base.as_str()))
    }
}

/// Case-insensitive containment against a vocabulary; `haystack` must already be lowercase.
pub(crate) fn contains_any(haystack: &str, needles: &[String]) -> bool {
    needles
        .iter()
        .any(|needle| haystack.contains(&needle.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE_SOURCE: &str = "from gpn_qa_utils.ui.pages import BasePage\n\nclass LoginPage(BasePage):\n    pass\n";

    fn classify(path: &str, content: &str) -> Category {
        FileClassifier::default().classify(Path::new(path), content)
    }

    #[test]
    fn test_names_win_first() {
        assert_eq!(classify("tests/test_login.py", ""), Category::Test);
        assert_eq!(classify("login_test.py", ""), Category::Test);
        assert_eq!(classify("Tests/TestLogin.py", ""), Category::Test);
        // test name beats page directory and fixture substring
        assert_eq!(classify("pages/test_page.py", PAGE_SOURCE), Category::Test);
        assert_eq!(classify("tests/test_fixtures.py", ""), Category::Test);
    }

    #[test]
    fn test_page_objects_need_directory_and_base_class() {
        assert_eq!(
            classify("pages/login_page.py", PAGE_SOURCE),
            Category::ReusableComponent
        );
        assert_eq!(
            classify("src/page_objects/login.py", PAGE_SOURCE),
            Category::ReusableComponent
        );
        assert_eq!(classify("pages/helpers.py", "def helper(): pass\n"), Category::Other);
        assert_eq!(classify("login_page.py", PAGE_SOURCE), Category::Other);
    }

    #[test]
    fn test_fixtures_and_config() {
        assert_eq!(classify("conftest.py", ""), Category::Fixture);
        assert_eq!(classify("tests/conftest.py", ""), Category::Fixture);
        assert_eq!(classify("support/browser_fixtures.py", ""), Category::Fixture);
        assert_eq!(classify("pytest.ini", ""), Category::Configuration);
        assert_eq!(classify("pyproject.toml", ""), Category::Configuration);
        assert_eq!(classify("utils/strings.py", ""), Category::Other);
    }

    #[test]
    fn test_classification_is_deterministic() {
        let first = classify("pages/login_page.py", PAGE_SOURCE);
        for _ in 0..10 {
            assert_eq!(classify("pages/login_page.py", PAGE_SOURCE), first);
        }
    }

    #[test]
    fn test_custom_rules_are_honoured() {
        let rules = ClassificationRules {
            component_dir_hints: vec!["screens".to_string()],
            component_base_types: vec!["BaseScreen".to_string()],
            ..ClassificationRules::default()
        };
        let classifier = FileClassifier::new(rules);
        let content = "class LoginScreen(BaseScreen):\n    pass\n";
        assert_eq!(
            classifier.classify(Path::new("screens/login.py"), content),
            Category::ReusableComponent
        );
        assert_eq!(
            classifier.classify(Path::new("pages/login.py"), content),
            Category::Other
        );
    }
}
