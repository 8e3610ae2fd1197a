// Message templates with positional placeholders

use std::fmt;
use std::sync::Arc;

/// Formats an error message for a field display name
pub type MessageFormatter = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Replace `{0}`, `{1}`, ... in `template` with `args`.
///
/// Placeholders without a matching argument are left untouched.
pub fn format_template(template: &str, args: &[&str]) -> String {
    let mut out = String::with_capacity(template.len() + 16);
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let replaced = after.find('}').and_then(|close| {
            after[..close]
                .parse::<usize>()
                .ok()
                .and_then(|i| args.get(i))
                .map(|arg| (close, *arg))
        });

        match replaced {
            Some((close, arg)) => {
                out.push_str(arg);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Override for the message an attribute reports
#[derive(Clone, Default)]
pub enum ErrorMessage {
    /// Use the attribute's built-in template
    #[default]
    Default,
    /// A template using the same placeholders as the built-in one
    Template(String),
    /// A function of the display name
    Formatter(MessageFormatter),
}

impl ErrorMessage {
    pub fn format(&self, default_template: &str, args: &[&str]) -> String {
        match self {
            ErrorMessage::Default => format_template(default_template, args),
            ErrorMessage::Template(template) => format_template(template, args),
            ErrorMessage::Formatter(f) => f(args.first().copied().unwrap_or_default()),
        }
    }
}

impl fmt::Debug for ErrorMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorMessage::Default => write!(f, "Default"),
            ErrorMessage::Template(t) => f.debug_tuple("Template").field(t).finish(),
            ErrorMessage::Formatter(_) => write!(f, "Formatter(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_template() {
        assert_eq!(
            format_template("The value '{0}' is not valid for {1}.", &["abcd", "Int32"]),
            "The value 'abcd' is not valid for Int32."
        );
        assert_eq!(format_template("{1}-{0}", &["a", "b"]), "b-a");
    }

    #[test]
    fn test_unmatched_placeholders_survive() {
        assert_eq!(format_template("{2} {x} {", &["a"]), "{2} {x} {");
    }

    #[test]
    fn test_error_message_variants() {
        let template = "The {0} field is required.";
        assert_eq!(
            ErrorMessage::Default.format(template, &["Name"]),
            "The Name field is required."
        );
        assert_eq!(
            ErrorMessage::Template("{0} is missing".into()).format(template, &["Name"]),
            "Name is missing"
        );
        let custom = ErrorMessage::Formatter(Arc::new(|name| format!("Hurts when '{}' is empty.", name)));
        assert_eq!(custom.format(template, &["Name"]), "Hurts when 'Name' is empty.");
    }
}
