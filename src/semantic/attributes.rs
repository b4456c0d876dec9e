//! `with` attribute checks and module version parsing.

use super::checker::Checker;
use super::diagnostics::{Diagnostic, codes};
use crate::base::Name;
use crate::syntax::{AttributeKind, SingleAttribute, WithAttributes};

/// The text after `version` in an extension attribute, if it is one.
pub fn version_spec(specification: &str) -> Option<&str> {
    let rest = specification.trim().strip_prefix("version")?;
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        Some(rest.trim())
    } else {
        None
    }
}

/// Parse a version such as `R1A`, `R2B01` or `CNL 113 512 R9A`.
///
/// The last word is the revision: `R`, a number, one upper case letter and
/// optionally a number. Any words before it form the product number.
pub fn parse_version(text: &str) -> Result<Name, String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    let Some((revision, product)) = words.split_last() else {
        return Err("Missing version number after `version'".to_string());
    };
    if !product
        .iter()
        .all(|word| word.chars().all(|c| c.is_ascii_alphanumeric() || c == '/'))
    {
        return Err(format!("Could not parse product number in version `{}'", text));
    }
    let Some(rest) = revision.strip_prefix('R') else {
        return Err(format!("Could not parse version `{}'", text));
    };
    let digits = rest.chars().take_while(|c| c.is_ascii_digit()).count();
    let mut tail = rest[digits..].chars();
    let letter = tail.next();
    let valid = digits > 0
        && letter.is_some_and(|c| c.is_ascii_uppercase())
        && tail.all(|c| c.is_ascii_digit());
    if !valid {
        return Err(format!("Could not parse version `{}'", text));
    }
    Ok(Name::from(words.join(" ")))
}

impl<'c, 'a> Checker<'c, 'a> {
    /// Check one `with` clause. The `version` extension is accepted only
    /// on modules, where it sets the module version.
    pub fn check_with_attributes(&self, with: Option<&'a WithAttributes>, module_level: bool) {
        let Some(with) = with else {
            return;
        };
        let mut encode: Option<&SingleAttribute> = None;
        let mut version: Option<&SingleAttribute> = None;
        let mut variant: Option<&SingleAttribute> = None;
        for attr in &with.attributes {
            if attr.specification.trim().is_empty() {
                self.warning(
                    attr.location,
                    codes::ATTRIBUTE_WARNING,
                    format!("Empty `{}' attribute specification", attr.kind.as_str()),
                );
                continue;
            }
            match attr.kind {
                AttributeKind::Encode => {
                    if let Some(previous) = encode {
                        self.cx.markers.report(
                            Diagnostic::warning(
                                attr.location,
                                "Only one `encode' attribute is used per `with' statement; \
                                 this one overrides the previous one",
                            )
                            .with_code(codes::ATTRIBUTE_WARNING)
                            .with_related(previous.location, "previous encode attribute"),
                        );
                    }
                    encode = Some(attr);
                }
                AttributeKind::Extension => {
                    let Some(text) = version_spec(&attr.specification) else {
                        continue;
                    };
                    if !module_level {
                        self.warning(
                            attr.location,
                            codes::ATTRIBUTE_WARNING,
                            "The `version' extension is only used on modules",
                        );
                        continue;
                    }
                    if version.is_some() {
                        self.error(
                            attr.location,
                            codes::INVALID_ATTRIBUTE,
                            "Duplicate version attribute",
                        );
                        continue;
                    }
                    version = Some(attr);
                    match parse_version(text) {
                        Ok(parsed) => {
                            tracing::trace!(
                                module = %self.module.name(),
                                version = %parsed,
                                "module version"
                            );
                            *self.module.version.lock() = Some(parsed);
                        }
                        Err(message) => {
                            self.error(attr.location, codes::INVALID_ATTRIBUTE, message)
                        }
                    }
                }
                AttributeKind::Optional => {
                    let spec = attr.specification.trim();
                    if spec != "implicit omit" && spec != "explicit omit" {
                        self.error(
                            attr.location,
                            codes::INVALID_ATTRIBUTE,
                            format!(
                                "Invalid `optional' attribute `{}': \
                                 expected `implicit omit' or `explicit omit'",
                                spec
                            ),
                        );
                    }
                }
                AttributeKind::Variant => {
                    variant = variant.or(Some(attr));
                }
                AttributeKind::Display => {}
            }
        }
        if module_level && encode.is_none() {
            if let Some(attr) = variant {
                self.warning(
                    attr.location,
                    codes::ATTRIBUTE_WARNING,
                    "`variant' attribute on a module without an `encode' attribute has no effect",
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantic::test_support::{check_modules, messages};
    use rstest::rstest;

    #[rstest]
    #[case("R1A", Some("R1A"))]
    #[case("R2B01", Some("R2B01"))]
    #[case("CNL 113 512 R9A", Some("CNL 113 512 R9A"))]
    #[case("1A", None)]
    #[case("R1", None)]
    #[case("Rx1A", None)]
    #[case("", None)]
    fn test_parse_version(#[case] text: &str, #[case] expected: Option<&str>) {
        assert_eq!(parse_version(text).ok().as_deref(), expected);
    }

    #[test]
    fn test_version_spec_requires_keyword() {
        assert_eq!(version_spec(" version R1A "), Some("R1A"));
        assert_eq!(version_spec("versionR1A"), None);
        assert_eq!(version_spec("requires X"), None);
    }

    #[test]
    fn test_module_version_is_recorded() {
        let (set, markers) = check_modules(&["module M { } with { extension \"version R3C\" }"]);
        assert!(markers.all().is_empty());
        assert_eq!(set.get("M").and_then(|m| m.version()).as_deref(), Some("R3C"));
    }

    #[test]
    fn test_attribute_diagnostics() {
        let (_, markers) = check_modules(&["module M {
            const integer c := 1 with { extension \"version R1A\"; optional \"sometimes\" }
        } with {
            encode \"BER\";
            encode \"PER\";
            extension \"version X\";
            extension \"version R1A\";
            variant \"\"
        }"]);
        let msgs = messages(&markers);
        assert!(msgs.iter().any(|m| m.contains("only used on modules")), "{:?}", msgs);
        assert!(msgs.iter().any(|m| m.contains("Invalid `optional' attribute")));
        assert!(msgs.iter().any(|m| m.contains("overrides the previous one")));
        assert!(msgs.iter().any(|m| m.contains("Could not parse version `X'")));
        assert!(msgs.iter().any(|m| m.contains("Duplicate version attribute")));
        assert!(msgs.iter().any(|m| m.contains("Empty `variant'")));
        assert!(!msgs.iter().any(|m| m.contains("without an `encode'")));
    }

    #[test]
    fn test_variant_without_encode() {
        let (_, markers) = check_modules(&["module M { } with { variant \"TAG\" }"]);
        let warnings = markers.all();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("without an `encode'"));
    }
}
