//! Signature Inspector
//!
//! Derives formal-parameter descriptors from a callable's metadata and
//! parses explicit signatures such as `"array $items, Countable $c, $x = null"`.
//!
//! Descriptor forms:
//!
//! | Parameter                     | Descriptor          |
//! |-------------------------------|---------------------|
//! | untyped                       | `$x`                |
//! | array-constrained             | `array $x`          |
//! | class/interface-constrained   | `Fully\Qualified $x`|
//! | optional (defaults to null)   | `... $x = null`     |

use mimic_sdk::{Callable, ParameterDescriptor, TypeConstraint, ARRAY_KEYWORD};
use rustc_hash::FxHashSet;

use crate::error::{SynthError, SynthResult};

/// Parameter descriptors of a callable, in declaration order.
///
/// Fails with `UninspectableCallable` if the callable is opaque.
pub fn inspect(callable: &Callable) -> SynthResult<Vec<ParameterDescriptor>> {
    inspect_for("anonymous callable", callable)
}

pub(crate) fn inspect_for(
    subject: &str,
    callable: &Callable,
) -> SynthResult<Vec<ParameterDescriptor>> {
    callable
        .parameters()
        .map(<[ParameterDescriptor]>::to_vec)
        .ok_or_else(|| SynthError::UninspectableCallable {
            subject: subject.to_string(),
        })
}

/// Rendered descriptor strings of a callable, one per parameter
pub fn signature_args(callable: &Callable) -> SynthResult<Vec<String>> {
    Ok(inspect(callable)?.iter().map(ToString::to_string).collect())
}

/// Render descriptors as a comma separated signature
pub fn render_signature(parameters: &[ParameterDescriptor]) -> String {
    parameters
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse an explicit signature into descriptors.
///
/// An empty (or blank) signature declares no parameters. Parameter names
/// must be unique.
pub fn parse_signature(signature: &str) -> SynthResult<Vec<ParameterDescriptor>> {
    if signature.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut seen = FxHashSet::default();
    let mut parameters = Vec::new();
    for part in signature.split(',') {
        let param = parse_descriptor(part)
            .map_err(|reason| SynthError::invalid_signature(signature, reason))?;
        if !seen.insert(param.name.clone()) {
            return Err(SynthError::invalid_signature(
                signature,
                format!("duplicate parameter ${}", param.name),
            ));
        }
        parameters.push(param);
    }
    Ok(parameters)
}

/// Parse a single descriptor such as `array $items` or `$x = null`
pub fn parse_descriptor(text: &str) -> Result<ParameterDescriptor, String> {
    let (head, optional) = match text.split_once('=') {
        Some((head, default)) => {
            if !default.trim().eq_ignore_ascii_case("null") {
                return Err(format!(
                    "unsupported default '{}', only null is allowed",
                    default.trim()
                ));
            }
            (head, true)
        }
        None => (text, false),
    };

    let tokens: Vec<&str> = head.split_whitespace().collect();
    let (constraint, variable) = match tokens.as_slice() {
        [] => return Err("empty parameter".to_string()),
        [variable] => (None, *variable),
        [type_name, variable] => (Some(parse_constraint(type_name)?), *variable),
        _ => return Err(format!("unexpected tokens in '{}'", head.trim())),
    };

    let name = variable
        .strip_prefix('$')
        .ok_or_else(|| format!("parameter '{}' must start with $", variable))?;
    if !is_identifier(name) {
        return Err(format!("invalid parameter name '{}'", variable));
    }

    Ok(ParameterDescriptor {
        constraint,
        name: name.to_string(),
        optional,
    })
}

fn parse_constraint(type_name: &str) -> Result<TypeConstraint, String> {
    if type_name.eq_ignore_ascii_case(ARRAY_KEYWORD) {
        return Ok(TypeConstraint::Array);
    }
    let normalized = normalize_type_name(type_name);
    if !is_qualified_name(normalized) {
        return Err(format!("invalid type name '{}'", type_name));
    }
    Ok(TypeConstraint::Named(normalized.to_string()))
}

/// Strip the leading namespace separator from a type name
pub fn normalize_type_name(name: &str) -> &str {
    name.strip_prefix('\\').unwrap_or(name)
}

/// Letters, digits and underscores, not starting with a digit
pub(crate) fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Identifiers joined by namespace separators
pub(crate) fn is_qualified_name(name: &str) -> bool {
    !name.is_empty() && name.split('\\').all(is_identifier)
}
