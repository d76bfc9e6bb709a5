//! Built-in pseudo-methods on literal strings and arrays.
//!
//! Zephir lets scripts call methods on scalar values (`"abc"->length()`,
//! `[1, 2]->join(",")`). PHP has no such thing, so each pseudo-method is
//! mapped onto a plain function call with the receiver moved into the
//! argument list. This module only describes the mappings; the emitter
//! decides how the rearranged arguments are rendered.

use std::fmt;

use crate::error::{CoreError, Location};

/// Receiver type a pseudo-method is defined on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiverKind {
    String,
    Array,
}

impl fmt::Display for ReceiverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReceiverKind::String => f.write_str("string"),
            ReceiverKind::Array => f.write_str("array"),
        }
    }
}

/// Metadata about a single pseudo-method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodMapping {
    pub receiver: ReceiverKind,

    /// Name at the Zephir level (e.g., `trimLeft`).
    pub method: &'static str,

    /// PHP function the call is rewritten to (e.g., `ltrim`).
    pub function: &'static str,

    /// Argument order, comma separated:
    /// `O` is the receiver, `N` the N-th call-site argument (1-based) and
    /// `*` every call-site argument not picked by a numeric token.
    pub parameters: &'static str,

    /// The PHP function modifies its first argument by reference.
    pub in_place: bool,
}

/// One token of a `parameters` grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamToken {
    Receiver,
    Rest,
    Nth(usize),
}

const fn string_method(method: &'static str, function: &'static str) -> MethodMapping {
    MethodMapping {
        receiver: ReceiverKind::String,
        method,
        function,
        parameters: "O,*",
        in_place: false,
    }
}

const fn array_method(
    method: &'static str,
    function: &'static str,
    parameters: &'static str,
    in_place: bool,
) -> MethodMapping {
    MethodMapping {
        receiver: ReceiverKind::Array,
        method,
        function,
        parameters,
        in_place,
    }
}

pub const STRING_METHODS: &[MethodMapping] = &[
    string_method("index", "strpos"),
    string_method("trim", "trim"),
    string_method("trimLeft", "ltrim"),
    string_method("trimRight", "rtrim"),
    string_method("length", "strlen"),
    string_method("lower", "strtolower"),
    string_method("upper", "strtoupper"),
    string_method("lowerFirst", "lcfirst"),
    string_method("upperFirst", "ucfirst"),
    string_method("format", "sprintf"),
    string_method("md5", "md5"),
    string_method("sha1", "sha1"),
    string_method("nl2br", "nl2br"),
    string_method("parseCsv", "str_getcsv"),
    string_method("parseJson", "json_decode"),
    string_method("toJson", "json_encode"),
    string_method("toutf8", "utf8_encode"),
    string_method("repeat", "str_repeat"),
    string_method("shuffle", "str_shuffle"),
    string_method("split", "str_split"),
    string_method("compare", "strcmp"),
    string_method("compareLocale", "strcoll"),
    string_method("rev", "strrev"),
    string_method("htmlSpecialChars", "htmlspecialchars"),
    string_method("camelize", "camelize"),
    string_method("uncamelize", "uncamelize"),
];

pub const ARRAY_METHODS: &[MethodMapping] = &[
    array_method("join", "implode", "1,O", false),
    array_method("reversed", "array_reverse", "O,*", false),
    array_method("rev", "array_reverse", "O,*", false),
    array_method("diff", "array_diff", "O,*", false),
    array_method("flip", "array_flip", "O", false),
    array_method("fill", "array_fill", "O,*", false),
    array_method("walk", "array_walk", "O,*", true),
    array_method("haskey", "array_key_exists", "O,*", false),
    array_method("keys", "array_keys", "O,*", false),
    array_method("values", "array_values", "O", false),
    array_method("split", "array_chunk", "O,*", false),
    array_method("combine", "array_combine", "*", false),
    array_method("intersect", "array_intersect", "O,*", false),
    array_method("merge", "array_merge", "O,*", false),
    array_method("mergerecursive", "array_merge_recursive", "O,*", false),
    array_method("pad", "array_pad", "O,*", false),
    array_method("pop", "array_pop", "O", true),
    array_method("push", "array_push", "O,*", true),
    array_method("rand", "array_rand", "O,*", false),
    array_method("replace", "array_replace", "O,*", false),
    array_method("map", "array_map", "1,O,*", false),
    array_method("replacerecursive", "array_replace_recursive", "O,*", false),
    array_method("shift", "array_shift", "O", true),
    array_method("slice", "array_slice", "O,*", false),
    array_method("splice", "array_splice", "O,*", true),
    array_method("sum", "array_sum", "O", false),
    array_method("unique", "array_unique", "O,*", false),
    array_method("prepend", "array_unshift", "O,*", true),
    array_method("count", "count", "O,*", false),
    array_method("current", "current", "O", false),
    array_method("each", "each", "O", true),
    array_method("end", "end", "O", true),
    array_method("key", "key", "O", false),
    array_method("next", "next", "O", true),
    array_method("prev", "prev", "O", true),
    array_method("reset", "reset", "O", true),
    array_method("sort", "sort", "O,*", true),
    array_method("sortbykey", "ksort", "O,*", true),
    array_method("reversesort", "rsort", "O,*", true),
    array_method("reversesortbykey", "krsort", "O,*", true),
    array_method("shuffle", "shuffle", "O", true),
    array_method("tojson", "json_encode", "O,*", false),
    array_method("reduce", "array_reduce", "O,*", false),
];

/// Look up a pseudo-method by receiver kind and Zephir-level name.
///
/// Method names are case-insensitive, as they are in PHP, so `toJson` and
/// `tojson` both match. The search is linear because the tables are small.
pub fn find_method(receiver: ReceiverKind, method: &str) -> Option<&'static MethodMapping> {
    let table = match receiver {
        ReceiverKind::String => STRING_METHODS,
        ReceiverKind::Array => ARRAY_METHODS,
    };
    table
        .iter()
        .find(|mapping| mapping.method.eq_ignore_ascii_case(method))
}

/// Like [`find_method`], but a miss is a compile error.
pub fn resolve(
    receiver: ReceiverKind,
    method: &str,
    location: &Location,
) -> Result<&'static MethodMapping, CoreError> {
    find_method(receiver, method).ok_or_else(|| CoreError::UnknownBuiltinMethod {
        method: method.to_string(),
        receiver: receiver.to_string(),
        location: location.clone(),
    })
}

impl MethodMapping {
    pub fn tokens(&self) -> impl Iterator<Item = ParamToken> + '_ {
        self.parameters
            .split(',')
            .map(str::trim)
            .filter_map(|token| match token {
                "O" => Some(ParamToken::Receiver),
                "*" => Some(ParamToken::Rest),
                n => n.parse().ok().filter(|n| *n > 0).map(ParamToken::Nth),
            })
    }

    /// Orders the receiver and the call-site arguments for the target
    /// function. Numeric tokens past the end of `args` are skipped.
    pub fn arrange<T>(&self, receiver: T, args: Vec<T>) -> Vec<T> {
        let picked: Vec<usize> = self
            .tokens()
            .filter_map(|token| match token {
                ParamToken::Nth(n) => Some(n - 1),
                _ => None,
            })
            .collect();
        let mut receiver = Some(receiver);
        let mut args: Vec<Option<T>> = args.into_iter().map(Some).collect();
        let mut ordered = Vec::with_capacity(args.len() + 1);
        for token in self.tokens() {
            match token {
                ParamToken::Receiver => ordered.extend(receiver.take()),
                ParamToken::Nth(n) => {
                    if let Some(slot) = args.get_mut(n - 1) {
                        ordered.extend(slot.take());
                    }
                }
                ParamToken::Rest => {
                    for (index, slot) in args.iter_mut().enumerate() {
                        if !picked.contains(&index) {
                            ordered.extend(slot.take());
                        }
                    }
                }
            }
        }
        ordered
    }
}
