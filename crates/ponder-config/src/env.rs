use std::borrow::Cow;
use std::sync::OnceLock;

use regex::{Captures, Regex};

/// Matches `{{ env.VAR }}` and `{{ env.VAR | default("fallback") }}`
fn placeholder() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"\{\{\s*([a-zA-Z0-9_.]+)\s*(?:\|\s*default\("([^"]*)"\))?\s*\}\}"#).expect("must be valid regex")
    })
}

/// Expand `{{ env.VAR }}` placeholders in raw TOML text
///
/// A `| default("...")` suffix supplies the value when the variable is unset.
/// Comment lines are copied through untouched so commented-out secrets never
/// need to exist in the environment.
pub fn expand_env(input: &str) -> Result<String, String> {
    let mut lines = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            lines.push(Cow::Borrowed(line));
        } else {
            lines.push(expand_line(line)?);
        }
    }

    let mut output = lines.join("\n");
    if input.ends_with('\n') {
        output.push('\n');
    }

    Ok(output)
}

fn expand_line(line: &str) -> Result<Cow<'_, str>, String> {
    if !placeholder().is_match(line) {
        return Ok(Cow::Borrowed(line));
    }

    let mut expanded = String::with_capacity(line.len());
    let mut cursor = 0;

    for captures in placeholder().captures_iter(line) {
        let Some(whole) = captures.get(0) else { continue };
        expanded.push_str(&line[cursor..whole.start()]);
        expanded.push_str(&resolve(&captures)?);
        cursor = whole.end();
    }

    expanded.push_str(&line[cursor..]);
    Ok(Cow::Owned(expanded))
}

fn resolve(captures: &Captures<'_>) -> Result<String, String> {
    let key = captures.get(1).map_or("", |m| m.as_str());
    let fallback = captures.get(2).map(|m| m.as_str());

    let Some(var_name) = key.strip_prefix("env.").filter(|name| !name.contains('.')) else {
        return Err(format!("only variables scoped with 'env.' are supported: `{key}`"));
    };

    match (std::env::var(var_name), fallback) {
        (Ok(value), _) => Ok(value),
        (Err(_), Some(default)) => Ok(default.to_owned()),
        (Err(_), None) => Err(format!("environment variable not found: `{var_name}`")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_without_placeholders_is_unchanged() {
        let input = "[gateway]\napproach = \"bon\"\n";
        assert_eq!(expand_env(input).unwrap(), input);
    }

    #[test]
    fn expands_api_key() {
        temp_env::with_var("PONDER_TEST_KEY", Some("sk-test"), || {
            let result = expand_env("api_key = \"{{ env.PONDER_TEST_KEY }}\"").unwrap();
            assert_eq!(result, "api_key = \"sk-test\"");
        });
    }

    #[test]
    fn expands_several_placeholders_on_one_line() {
        let vars = [("PONDER_HOST", Some("localhost")), ("PONDER_PORT", Some("8080"))];
        temp_env::with_vars(vars, || {
            let result = expand_env("base_url = \"http://{{ env.PONDER_HOST }}:{{ env.PONDER_PORT }}/v1\"").unwrap();
            assert_eq!(result, "base_url = \"http://localhost:8080/v1\"");
        });
    }

    #[test]
    fn missing_variable_is_an_error() {
        temp_env::with_var_unset("PONDER_MISSING", || {
            let err = expand_env("model = \"{{ env.PONDER_MISSING }}\"").unwrap_err();
            assert!(err.contains("PONDER_MISSING"));
        });
    }

    #[test]
    fn default_applies_when_unset() {
        temp_env::with_var_unset("PONDER_MODEL", || {
            let result = expand_env("model = \"{{ env.PONDER_MODEL | default(\"gpt-4o-mini\") }}\"").unwrap();
            assert_eq!(result, "model = \"gpt-4o-mini\"");
        });
    }

    #[test]
    fn default_ignored_when_set() {
        temp_env::with_var("PONDER_MODEL", Some("llama-3"), || {
            let result = expand_env("model = \"{{ env.PONDER_MODEL | default(\"gpt-4o-mini\") }}\"").unwrap();
            assert_eq!(result, "model = \"llama-3\"");
        });
    }

    #[test]
    fn non_env_scope_is_rejected() {
        let err = expand_env("key = \"{{ secrets.KEY }}\"").unwrap_err();
        assert!(err.contains("only variables scoped with 'env.'"));
    }

    #[test]
    fn comments_are_not_expanded() {
        temp_env::with_var_unset("PONDER_MISSING", || {
            let input = "  # api_key = \"{{ env.PONDER_MISSING }}\"\nn = 1";
            assert_eq!(expand_env(input).unwrap(), input);
        });
    }
}
