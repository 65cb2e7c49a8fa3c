//! Key naming rules for serialized output
//!
//! Root keys and association keys follow the Rails/Ember conventions the
//! response format was designed around: side-loaded collections live under
//! the plural form of the type name, and every key is lower camel case.

use convert_case::{Case, Casing};

/// Words that are identical in singular and plural form
const UNCOUNTABLE: &[&str] = &[
	"equipment",
	"information",
	"rice",
	"money",
	"species",
	"series",
	"fish",
	"sheep",
	"jeans",
	"police",
	"news",
	"metadata",
];

/// Irregular singular/plural pairs
const IRREGULAR: &[(&str, &str)] = &[
	("person", "people"),
	("man", "men"),
	("child", "children"),
	("sex", "sexes"),
	("move", "moves"),
	("zombie", "zombies"),
	("ox", "oxen"),
	("mouse", "mice"),
	("louse", "lice"),
	("goose", "geese"),
	("tooth", "teeth"),
	("foot", "feet"),
];

/// Suffix rewrites, checked in order. `(suffix, strip, append)`: when the
/// word ends with `suffix`, drop `strip` trailing bytes and push `append`.
const SUFFIX_RULES: &[(&str, usize, &str)] = &[
	("quiz", 0, "zes"),
	("matrix", 2, "ices"),
	("vertex", 2, "ices"),
	("index", 2, "ices"),
	("octopus", 2, "i"),
	("virus", 2, "i"),
	("alias", 0, "es"),
	("status", 0, "es"),
	("axis", 2, "es"),
	("testis", 2, "es"),
	("buffalo", 0, "es"),
	("tomato", 0, "es"),
	("potato", 0, "es"),
	("hive", 0, "s"),
	("bus", 0, "es"),
	("ium", 2, "a"),
	("sis", 2, "es"),
	("ch", 0, "es"),
	("sh", 0, "es"),
	("ss", 0, "es"),
	("x", 0, "es"),
	("z", 0, "es"),
];

fn is_vowel(c: char) -> bool {
	matches!(c.to_ascii_lowercase(), 'a' | 'e' | 'i' | 'o' | 'u')
}

/// Copy the case of the first letter of `original` onto `replacement`
fn match_case(original: &str, replacement: &str) -> String {
	let upper = original.chars().next().is_some_and(char::is_uppercase);
	let mut chars = replacement.chars();
	match chars.next() {
		Some(first) if upper => first.to_uppercase().chain(chars).collect(),
		_ => replacement.to_string(),
	}
}

/// Split a compound word into its leading part and the final word
///
/// `"lineItem"` splits into `("line", "Item")`, `"line_item"` into
/// `("line_", "item")`. Only the final word is inflected.
fn split_last_word(word: &str) -> (&str, &str) {
	let mut start = 0;
	let mut prev: Option<char> = None;
	for (idx, c) in word.char_indices() {
		if matches!(c, '_' | '-' | ' ') {
			start = idx + c.len_utf8();
		} else if c.is_uppercase() && prev.is_some_and(|p| p.is_lowercase() || p.is_ascii_digit()) {
			start = idx;
		}
		prev = Some(c);
	}
	word.split_at(start)
}

/// Pluralize an English noun
///
/// Only the last word of a compound name is inflected, and its leading
/// capitalisation is kept. Words that are already plural come back unchanged.
///
/// # Examples
///
/// ```
/// use reinhardt_sideload::inflection::pluralize;
///
/// assert_eq!(pluralize("order"), "orders");
/// assert_eq!(pluralize("person"), "people");
/// assert_eq!(pluralize("category"), "categories");
/// assert_eq!(pluralize("lineItem"), "lineItems");
/// assert_eq!(pluralize("orders"), "orders");
/// ```
pub fn pluralize(word: &str) -> String {
	let (head, last) = split_last_word(word);
	if last.is_empty() {
		return word.to_string();
	}
	let lower = last.to_lowercase();

	if UNCOUNTABLE.contains(&lower.as_str()) {
		return word.to_string();
	}

	for (singular, plural) in IRREGULAR {
		if lower == *plural {
			return word.to_string();
		}
		if lower == *singular {
			return format!("{}{}", head, match_case(last, plural));
		}
	}

	for (suffix, strip, append) in SUFFIX_RULES {
		if lower.ends_with(suffix) {
			let keep = &last[..last.len() - strip];
			return format!("{}{}{}", head, keep, append);
		}
	}

	if let Some(stem) = lower.strip_suffix('y') {
		let consonant_y = stem.chars().last().is_some_and(|c| !is_vowel(c));
		let qu_y = stem.ends_with("qu");
		if consonant_y || qu_y {
			return format!("{}{}ies", head, &last[..last.len() - 1]);
		}
	}

	if lower.ends_with("fe") && !lower.ends_with("ffe") {
		return format!("{}{}ves", head, &last[..last.len() - 2]);
	}
	if lower.ends_with("lf") || lower.ends_with("rf") {
		return format!("{}{}ves", head, &last[..last.len() - 1]);
	}

	if lower.ends_with('s') {
		return word.to_string();
	}

	format!("{}s", word)
}

/// Convert a name to lower camel case
///
/// # Examples
///
/// ```
/// use reinhardt_sideload::inflection::camelize;
///
/// assert_eq!(camelize("line_item"), "lineItem");
/// assert_eq!(camelize("LineItem"), "lineItem");
/// assert_eq!(camelize("order"), "order");
/// ```
pub fn camelize(word: &str) -> String {
	word.to_case(Case::Camel)
}

/// Key under which an association's reference(s) are written on the parent
///
/// Belongs-to keys use the singular association name, has-many keys the
/// plural one. Both are lower camel case.
pub fn association_key(name: &str, many: bool) -> String {
	if many {
		camelize(&pluralize(name))
	} else {
		camelize(name)
	}
}

/// Root key of a serializer's output, given its sideload mode
pub fn root_key(name: &str, sideload: bool) -> String {
	if sideload {
		camelize(&pluralize(name))
	} else {
		camelize(name)
	}
}
