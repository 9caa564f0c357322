use regex::Regex;

use crate::config::PartitionConfig;

const FENCED_BLOCK: &str = r"(?s)```[ \t]*(?:python|py)?[ \t]*\r?\n(.*?)```";

/// Strips markdown code fences from a model reply.
///
/// When the reply has fenced blocks only their contents are kept, joined with a blank line.
/// Marker lines written between the blocks are kept in place so the partitioner still sees
/// them, while any other prose is dropped. Without fenced blocks a reply carrying markers loses
/// only its stray fence lines, and anything else is returned trimmed.
pub fn extract_code(output: &str, markers: &PartitionConfig) -> String {
    let mut pieces: Vec<&str> = Vec::new();
    if let Ok(re) = Regex::new(FENCED_BLOCK) {
        let mut last_end = 0;
        let mut found = false;
        for captures in re.captures_iter(output) {
            let (Some(whole), Some(code)) = (captures.get(0), captures.get(1)) else {
                continue;
            };
            found = true;
            pieces.extend(marker_lines(&output[last_end..whole.start()], markers));
            let code = code.as_str().trim();
            if !code.is_empty() {
                pieces.push(code);
            }
            last_end = whole.end();
        }
        if found {
            pieces.extend(marker_lines(&output[last_end..], markers));
        }
    }

    if !pieces.is_empty() {
        return pieces.join("\n\n");
    }

    if output.lines().any(|line| is_marker(line, markers)) {
        return output
            .lines()
            .filter(|line| !line.trim_start().starts_with("```"))
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string();
    }

    output.trim().to_string()
}

fn is_marker(line: &str, markers: &PartitionConfig) -> bool {
    line.contains(&markers.component_marker) || line.contains(&markers.test_marker)
}

fn marker_lines<'a>(text: &'a str, markers: &'a PartitionConfig) -> impl Iterator<Item = &'a str> {
    text.lines()
        .filter(move |line| is_marker(line, markers))
        .map(str::trim)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(output: &str) -> String {
        extract_code(output, &PartitionConfig::default())
    }

    #[test]
    fn test_extract_python_blocks() {
        let output = "Here is the page object:\n```python\nclass LoginPage:\n    pass\n```\nAnd the test:\n```\ndef test_login():\n    pass\n```\nDone.";
        assert_eq!(
            extract(output),
            "class LoginPage:\n    pass\n\ndef test_login():\n    pass"
        );
    }

    #[test]
    fn test_markers_survive_fence_removal() {
        let output = "```python\n# === PAGE OBJECT ===\nclass LoginPage:\n    pass\n# === TEST FUNCTION ===\ndef test_login():\n    pass\n```\n";
        assert_eq!(
            extract(output),
            "# === PAGE OBJECT ===\nclass LoginPage:\n    pass\n# === TEST FUNCTION ===\ndef test_login():\n    pass"
        );
    }

    #[test]
    fn test_prose_around_marked_blocks_is_dropped() {
        let output = "Sure, here it is:\n```python\n=== PAGE OBJECT ===\nclass LoginPage:\n    pass\n=== TEST FUNCTION ===\ndef test_login():\n    pass\n```\nThis test opens the login page.\n";
        assert_eq!(
            extract(output),
            "=== PAGE OBJECT ===\nclass LoginPage:\n    pass\n=== TEST FUNCTION ===\ndef test_login():\n    pass"
        );
    }

    #[test]
    fn test_markers_between_blocks_are_kept() {
        let output = "=== PAGE OBJECT ===\n```python\nclass LoginPage:\n    pass\n```\nNow the test.\n=== TEST FUNCTION ===\n```python\ndef test_login():\n    pass\n```\n";
        assert_eq!(
            extract(output),
            "=== PAGE OBJECT ===\n\nclass LoginPage:\n    pass\n\n=== TEST FUNCTION ===\n\ndef test_login():\n    pass"
        );
    }

    #[test]
    fn test_unfenced_markers_lose_only_fence_lines() {
        let output = "=== PAGE OBJECT ===\nclass LoginPage:\n    pass\n```\n";
        assert_eq!(extract(output), "=== PAGE OBJECT ===\nclass LoginPage:\n    pass");
    }

    #[test]
    fn test_plain_output_is_trimmed() {
        assert_eq!(extract("\n\n  x = 1\n\n"), "x = 1");
    }

    #[test]
    fn test_unterminated_fence_falls_back_to_raw_text() {
        assert_eq!(extract("```python\nx = 1\n"), "```python\nx = 1");
    }
}
