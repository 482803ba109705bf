//! Macro substitution for command templates and generated config files.
//!
//! Templates are processed line by line. A macro is the literal `${NAME}`.
//! Lines starting with `#` are copied verbatim and never scanned. Each
//! candidate parameter maps to a macro name, either directly or through a
//! keyword map, and its value is substituted (optionally through a
//! `{}`-style special format).

use super::error::{EngineError, Result};
use super::types::{yaml_value_to_string, VariableSet};
use indexmap::IndexMap;
use regex::Regex;
use std::collections::HashSet;
use std::path::Path;
use std::sync::LazyLock;

static LEFTOVER_MACRO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{[A-Za-z0-9_.\-]+\}").expect("static macro pattern"));

/// How a parameter name maps to the macro name searched for in the template.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KeywordPolicy {
    /// Use the keyword map entry when there is one, else the parameter name.
    #[default]
    Lenient,
    /// Every candidate parameter must have a keyword map entry.
    Strict,
}

/// Options for one render.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Parameter name → macro name
    pub keyword_map: IndexMap<String, String>,

    /// Fallback behaviour for names missing from `keyword_map`
    pub policy: KeywordPolicy,

    /// Macro name → `{}`-style format applied to the value
    pub special_values: IndexMap<String, String>,

    /// Drop a parameter from the candidates after the first line it matches
    pub single_appearance: bool,

    /// Macro names exempt from `single_appearance`
    pub multiple_appearances: HashSet<String>,
}

impl RenderOptions {
    /// Direct macro names, keyword map used only where it has entries.
    pub fn lenient() -> Self {
        Self::default()
    }

    /// Every parameter must be mapped through `keyword_map`.
    pub fn strict(keyword_map: IndexMap<String, String>) -> Self {
        Self {
            keyword_map,
            policy: KeywordPolicy::Strict,
            ..Self::default()
        }
    }

    pub fn with_keyword_map(mut self, keyword_map: IndexMap<String, String>) -> Self {
        self.keyword_map = keyword_map;
        self
    }

    pub fn with_special_values(mut self, special_values: IndexMap<String, String>) -> Self {
        self.special_values = special_values;
        self
    }

    /// Enable single-appearance mode; `repeated` macros may match on many lines.
    pub fn single_appearance<I, S>(mut self, repeated: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.single_appearance = true;
        self.multiple_appearances = repeated.into_iter().map(Into::into).collect();
        self
    }

    fn macro_name<'a>(&'a self, parameter: &'a str) -> Result<&'a str> {
        match (self.keyword_map.get(parameter), self.policy) {
            (Some(keyword), _) => Ok(keyword.as_str()),
            (None, KeywordPolicy::Lenient) => Ok(parameter),
            (None, KeywordPolicy::Strict) => Err(EngineError::InvalidParameter(format!(
                "parameter '{}' has no entry in the keyword map",
                parameter
            ))),
        }
    }
}

/// A macro found on a line: the parameter supplying the value and the macro name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroMatch {
    pub parameter: String,
    pub macro_name: String,
}

/// Find which candidate parameters have their macro on the given line.
pub fn find_macros(
    line: &str,
    candidates: &[String],
    opts: &RenderOptions,
) -> Result<Vec<MacroMatch>> {
    let mut found = Vec::new();
    for parameter in candidates {
        let macro_name = opts.macro_name(parameter)?;
        if line.contains(&macro_token(macro_name)) {
            found.push(MacroMatch {
                parameter: parameter.clone(),
                macro_name: macro_name.to_string(),
            });
        }
    }
    Ok(found)
}

/// Render template text with the given parameters.
pub fn render_str(template: &str, params: &VariableSet, opts: &RenderOptions) -> Result<String> {
    let mut candidates: Vec<String> = if params.is_empty() {
        opts.keyword_map.keys().cloned().collect()
    } else {
        params.names().cloned().collect()
    };

    let mut out = String::with_capacity(template.len());
    for line in template.lines() {
        if line.starts_with('#') {
            out.push_str(line);
            out.push('\n');
            continue;
        }

        let matches = find_macros(line, &candidates, opts)?;
        let mut rendered = line.to_string();
        for m in &matches {
            let value = params.get(&m.parameter).ok_or_else(|| {
                EngineError::InvalidParameter(format!(
                    "no value for parameter '{}' (macro ${{{}}})",
                    m.parameter, m.macro_name
                ))
            })?;
            let text = match opts.special_values.get(&m.macro_name) {
                Some(fmt) => format_special(fmt, value)?,
                None => yaml_value_to_string(value),
            };
            rendered = rendered.replace(&macro_token(&m.macro_name), &text);
        }

        if !matches.is_empty() {
            tracing::debug!(line, new_line = %rendered, "substituted macros");
            if opts.single_appearance {
                candidates.retain(|c| {
                    !matches.iter().any(|m| {
                        &m.parameter == c && !opts.multiple_appearances.contains(&m.macro_name)
                    })
                });
            }
        }

        if let Some(left) = LEFTOVER_MACRO.find(&rendered) {
            tracing::debug!(line = %rendered, "unresolved macro {}", left.as_str());
        }

        out.push_str(&rendered);
        out.push('\n');
    }

    Ok(out)
}

/// Render a template file to an output file.
///
/// I/O failures are logged and returned; a partially written output is left as is.
pub fn render(
    template_path: &Path,
    out_path: &Path,
    params: &VariableSet,
    opts: &RenderOptions,
) -> Result<()> {
    let template = std::fs::read_to_string(template_path).map_err(|e| {
        tracing::error!(
            "cannot read template {} for {}: {}",
            template_path.display(),
            out_path.display(),
            e
        );
        EngineError::io(template_path, e)
    })?;

    let rendered = render_str(&template, params, opts)?;

    std::fs::write(out_path, rendered).map_err(|e| {
        tracing::error!(
            "cannot write {} from template {}: {}",
            out_path.display(),
            template_path.display(),
            e
        );
        EngineError::io(out_path, e)
    })
}

/// Apply a `str.format`-style format string with a single positional value.
///
/// Supports `{}`, `{0}` and the `{{` / `}}` escapes.
pub fn format_special(fmt: &str, value: &serde_yaml_ng::Value) -> Result<String> {
    let text = yaml_value_to_string(value);
    let mut out = String::with_capacity(fmt.len() + text.len());
    let mut chars = fmt.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '{' => {
                let mut field = String::new();
                let mut closed = false;
                for f in chars.by_ref() {
                    if f == '}' {
                        closed = true;
                        break;
                    }
                    field.push(f);
                }
                if !closed {
                    return Err(EngineError::InvalidParameter(format!(
                        "unclosed field in format '{}'",
                        fmt
                    )));
                }
                match field.as_str() {
                    "" | "0" => out.push_str(&text),
                    other => {
                        return Err(EngineError::InvalidParameter(format!(
                            "unsupported field '{{{}}}' in format '{}'",
                            other, fmt
                        )))
                    }
                }
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '}' => {
                return Err(EngineError::InvalidParameter(format!(
                    "single '}}' in format '{}'",
                    fmt
                )))
            }
            other => out.push(other),
        }
    }

    Ok(out)
}

fn macro_token(name: &str) -> String {
    format!("${{{}}}", name)
}
