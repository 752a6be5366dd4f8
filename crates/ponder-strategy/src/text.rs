//! Text helpers shared by strategies for reading model replies

use std::sync::OnceLock;

use regex::Regex;

/// Content between `<tag>` and `</tag>`, trimmed
///
/// An opening tag without a closing one yields everything after it.
pub fn extract_tag<'a>(text: &'a str, tag: &str) -> Option<&'a str> {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");

    let start = text.find(&open)? + open.len();
    let rest = &text[start..];
    let end = rest.find(&close).unwrap_or(rest.len());

    Some(rest[..end].trim())
}

/// First number in a rating reply, clamped to `0.0..=max`
///
/// Replies without a number rate as zero.
pub fn parse_score(text: &str, max: f64) -> f64 {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"-?\d+(?:\.\d+)?").expect("must be valid regex"));

    re.find(text)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .map_or(0.0, |score| score.clamp(0.0, max))
}

/// Body of the first fenced code block, or the whole text when unfenced
pub fn extract_code(text: &str) -> &str {
    let Some(open) = text.find("```") else {
        return text.trim();
    };

    let after_fence = &text[open + 3..];
    // Skip the language tag on the fence line
    let body_start = after_fence.find('\n').map_or(0, |i| i + 1);
    let body = &after_fence[body_start..];

    body.find("```").map_or(body, |close| &body[..close]).trim()
}

/// Items of a numbered list (`1. foo`, `2) bar`)
///
/// Falls back to the non-empty lines when the reply is not numbered.
pub fn numbered_items(text: &str) -> Vec<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"^\s*\d+[.)]\s*(.+)$").expect("must be valid regex"));

    let numbered: Vec<String> = text
        .lines()
        .filter_map(|line| re.captures(line))
        .filter_map(|c| c.get(1).map(|m| m.as_str().trim().to_owned()))
        .filter(|item| !item.is_empty())
        .collect();

    if numbered.is_empty() {
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_owned)
            .collect()
    } else {
        numbered
    }
}

/// Word-level similarity ratio in `0.0..=1.0`
///
/// Computed as `2 * lcs / (len_a + len_b)` over whitespace-separated,
/// lowercased words. Two empty texts are identical.
#[allow(clippy::cast_precision_loss)]
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<String> = a.split_whitespace().map(str::to_lowercase).collect();
    let b: Vec<String> = b.split_whitespace().map(str::to_lowercase).collect();

    if a.is_empty() && b.is_empty() {
        return 1.0;
    }

    // Single-row LCS table
    let mut row = vec![0usize; b.len() + 1];
    for word_a in &a {
        let mut diagonal = 0;
        for (j, word_b) in b.iter().enumerate() {
            let above = row[j + 1];
            row[j + 1] = if word_a == word_b {
                diagonal + 1
            } else {
                above.max(row[j])
            };
            diagonal = above;
        }
    }

    let lcs = row[b.len()];
    (2 * lcs) as f64 / (a.len() + b.len()) as f64
}

/// Final answer stated in a reasoning chain
///
/// Looks for "the answer is" (case-insensitive) and takes the rest of that
/// line; otherwise uses the last non-empty line.
pub fn final_answer(text: &str) -> Option<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"(?i)the (?:final )?answer is[:\s]*(.+)").expect("must be valid regex"));

    let answer = re.captures_iter(text).last().and_then(|c| c.get(1)).map_or_else(
        || text.lines().rev().map(str::trim).find(|line| !line.is_empty()),
        |m| Some(m.as_str()),
    )?;

    let answer = answer.trim().trim_end_matches('.').trim();
    (!answer.is_empty()).then(|| answer.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_tag_content() {
        let text = "<thinking>hmm</thinking>\n<output>\n42\n</output>";
        assert_eq!(extract_tag(text, "output"), Some("42"));
        assert_eq!(extract_tag(text, "thinking"), Some("hmm"));
        assert_eq!(extract_tag(text, "reflection"), None);
    }

    #[test]
    fn unclosed_tag_runs_to_end() {
        assert_eq!(extract_tag("<output> partial", "output"), Some("partial"));
    }

    #[test]
    fn parses_scores() {
        assert!((parse_score("8", 10.0) - 8.0).abs() < f64::EPSILON);
        assert!((parse_score("Score: 7.5/10", 10.0) - 7.5).abs() < f64::EPSILON);
        assert!((parse_score("I'd say 14", 10.0) - 10.0).abs() < f64::EPSILON);
        assert!(parse_score("no idea", 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn extracts_fenced_code() {
        let text = "Here you go:\n```python\nprint('hi')\n```\nDone.";
        assert_eq!(extract_code(text), "print('hi')");
        assert_eq!(extract_code("  x = 1  "), "x = 1");
    }

    #[test]
    fn parses_numbered_lists() {
        let items = numbered_items("Observations:\n1. sort first\n2) use a heap\n\n3. mind overflow");
        assert_eq!(items, vec!["sort first", "use a heap", "mind overflow"]);

        let items = numbered_items("sort first\n\nuse a heap");
        assert_eq!(items, vec!["sort first", "use a heap"]);
    }

    #[test]
    fn similarity_bounds() {
        assert!((similarity("The answer is 4", "the answer is 4") - 1.0).abs() < f64::EPSILON);
        assert!(similarity("alpha beta", "gamma delta").abs() < f64::EPSILON);
        assert!((similarity("", "") - 1.0).abs() < f64::EPSILON);

        let partial = similarity("the answer is 4", "the answer is 5");
        assert!(partial > 0.7 && partial < 1.0);
    }

    #[test]
    fn finds_final_answer() {
        assert_eq!(
            final_answer("Step 1: add.\nThe answer is 12."),
            Some("12".to_owned())
        );
        assert_eq!(final_answer("first\nsecond line\n"), Some("second line".to_owned()));
        assert_eq!(final_answer("   "), None);
    }
}
