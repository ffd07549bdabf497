/*
 * parser.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Filter query parser.
//!
//! Grammar:
//!
//! ```text
//! filter   := field (',' field)*
//! field    := name call* ('{' filter '}')?
//! call     := '.' fn_name '(' args ')'
//! fn_name  := 'limit' | 'sort'
//! ```
//!
//! Parsing is best-effort and never fails. A fragment that does not match
//! the grammar contributes no field, and an unknown function call is skipped
//! while the field it is attached to is kept.

use crate::ast::{Filter, FilterField, FilterFunction, FunctionCall};
use heck::ToSnakeCase;

impl Filter {
    /// Parse a filter query such as `user{name,posts.limit(3)}`.
    pub fn parse(query: &str) -> Filter {
        let mut parser = QueryParser::new(query);
        let mut filter = parser.parse_filter(None);
        // A stray closing brace at the top level only ends its own fragment.
        while parser.eat('}') {
            let rest = parser.parse_filter(None);
            filter.fields.extend(rest.fields);
        }
        filter
    }
}

/// Internal parser state.
struct QueryParser<'a> {
    /// The query being parsed.
    source: &'a str,

    /// Byte offset of the next unread character.
    pos: usize,
}

impl<'a> QueryParser<'a> {
    fn new(source: &'a str) -> Self {
        Self { source, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn parse_filter(&mut self, parent: Option<String>) -> Filter {
        let mut fields = Vec::new();

        loop {
            self.skip_whitespace();
            match self.peek() {
                None | Some('}') => break,
                Some(',') => {
                    self.bump();
                    continue;
                }
                Some(_) => {}
            }

            let start = self.pos;
            match self.parse_field() {
                Some(field) => fields.push(field),
                None => {
                    self.skip_fragment();
                    tracing::trace!(
                        fragment = &self.source[start..self.pos],
                        "ignoring unmatched filter fragment"
                    );
                }
            }

            self.skip_whitespace();
            match self.peek() {
                None | Some('}') => break,
                Some(',') => {
                    self.bump();
                }
                Some(_) => {
                    let start = self.pos;
                    self.skip_fragment();
                    tracing::trace!(
                        fragment = &self.source[start..self.pos],
                        "ignoring trailing filter text"
                    );
                }
            }
        }

        Filter { fields, parent }
    }

    fn parse_field(&mut self) -> Option<FilterField> {
        let name = self.parse_name()?;
        let mut field = FilterField::new(name);

        while self.peek() == Some('.') {
            self.bump();
            let call_name = self.parse_name()?;
            let args = self.parse_args()?;
            match FilterFunction::from_name(call_name) {
                Some(function) if accepts_args(function, &args) => {
                    field.functions.push(FunctionCall { function, args });
                }
                _ => {
                    tracing::trace!(
                        field = %field.name,
                        function = call_name,
                        "ignoring unsupported filter function"
                    );
                }
            }
        }

        self.skip_whitespace();
        if self.eat('{') {
            let nested = self.parse_filter(Some(underscore(&field.name)));
            if !self.eat('}') {
                // An unterminated group matches nothing.
                return None;
            }
            field.nested = Some(nested);
        }

        Some(field)
    }

    fn parse_name(&mut self) -> Option<&'a str> {
        let source = self.source;
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '-')
        {
            self.bump();
        }
        let end = self.pos;
        (end > start).then(|| &source[start..end])
    }

    fn parse_args(&mut self) -> Option<Vec<String>> {
        if !self.eat('(') {
            return None;
        }
        let start = self.pos;
        while let Some(c) = self.bump() {
            if c == ')' {
                let inner = &self.source[start..self.pos - 1];
                let args = inner
                    .split(',')
                    .map(str::trim)
                    .filter(|arg| !arg.is_empty())
                    .map(str::to_string)
                    .collect();
                return Some(args);
            }
            if matches!(c, '(' | '{' | '}') {
                return None;
            }
        }
        None
    }

    /// Skip to the next `,` or `}` that is not inside a group.
    fn skip_fragment(&mut self) {
        let mut depth = 0usize;
        while let Some(c) = self.peek() {
            match c {
                '{' | '(' => depth += 1,
                '}' | ')' if depth > 0 => depth -= 1,
                ',' | '}' if depth == 0 => return,
                _ => {}
            }
            self.bump();
        }
    }
}

fn accepts_args(function: FilterFunction, args: &[String]) -> bool {
    match function {
        FilterFunction::Limit => args.len() == 1 && args[0].parse::<usize>().is_ok(),
        FilterFunction::Sort => {
            args.len() <= 2 && args.get(1).is_none_or(|dir| dir == "asc" || dir == "desc")
        }
    }
}

/// Convert a field name to its underscored form (`userProfile` becomes
/// `user_profile`).
pub fn underscore(name: &str) -> String {
    name.to_snake_case()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_nested_with_limit() {
        let filter = Filter::parse("user{name,age.limit(1)}");

        assert_eq!(filter.fields().len(), 1);
        let user = filter.get_filter("user").unwrap();
        assert!(user.functions.is_empty());

        let nested = user.nested.as_ref().unwrap();
        assert_eq!(nested.parent(), Some("user"));
        let names: Vec<&str> = nested.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["name", "age"]);

        let age = nested.get_filter("age").unwrap();
        assert_eq!(
            age.functions,
            vec![FunctionCall {
                function: FilterFunction::Limit,
                args: vec!["1".to_string()],
            }]
        );
    }

    #[test]
    fn test_flat_fields() {
        let filter = Filter::parse("id, name ,email");
        assert!(filter.has_filter_for("id"));
        assert!(filter.has_filter_for("name"));
        assert!(filter.has_filter_for("email"));
        assert!(!filter.has_filter_for("Name"));
    }

    #[test]
    fn test_chained_functions_keep_order() {
        let filter = Filter::parse("posts.sort(title, desc).limit(2)");
        let posts = filter.get_filter("posts").unwrap();
        let functions: Vec<FilterFunction> = posts.functions.iter().map(|c| c.function).collect();
        assert_eq!(functions, vec![FilterFunction::Sort, FilterFunction::Limit]);
        assert_eq!(posts.functions[0].args, vec!["title", "desc"]);
    }

    #[test]
    fn test_unknown_function_is_ignored() {
        let filter = Filter::parse("posts.shuffle(3),name");
        let posts = filter.get_filter("posts").unwrap();
        assert!(posts.functions.is_empty());
        assert!(filter.has_filter_for("name"));
    }

    #[test]
    fn test_bad_limit_argument_is_ignored() {
        let filter = Filter::parse("posts.limit(many)");
        assert!(filter.get_filter("posts").unwrap().functions.is_empty());
    }

    #[test]
    fn test_malformed_fragments_never_fail() {
        let filter = Filter::parse("name,{oops},posts.limit(,ok");
        assert!(filter.has_filter_for("name"));
        assert!(!filter.has_filter_for("posts"));
        assert!(!filter.has_filter_for("ok"));

        assert!(Filter::parse("").is_empty());
        assert!(Filter::parse(",,,").is_empty());
    }

    #[test]
    fn test_stray_closing_brace() {
        let filter = Filter::parse("id},name");
        assert!(filter.has_filter_for("id"));
        assert!(filter.has_filter_for("name"));
    }

    #[test]
    fn test_unterminated_group_drops_field() {
        let filter = Filter::parse("id,user{name");
        assert!(filter.has_filter_for("id"));
        assert!(!filter.has_filter_for("user"));
    }

    #[test]
    fn test_first_match_wins() {
        let filter = Filter::parse("tags.limit(1),tags.limit(5)");
        let tags = filter.get_filter("tags").unwrap();
        assert_eq!(tags.functions[0].args, vec!["1"]);
    }

    #[test]
    fn test_deep_nesting_parents() {
        let filter = Filter::parse("authorProfile{recentPosts{title}}");
        let profile = filter.nested_for("authorProfile").unwrap();
        assert_eq!(profile.parent(), Some("author_profile"));
        let posts = profile.nested_for("recentPosts").unwrap();
        assert_eq!(posts.parent(), Some("recent_posts"));
        assert!(posts.has_filter_for("title"));
    }

    #[test]
    fn test_display_round_trip() {
        let query = "user{name,age.limit(1)},posts.sort(title,desc)";
        let filter = Filter::parse(query);
        assert_eq!(filter.to_string(), query);
        assert_eq!(Filter::parse(&filter.to_string()), filter);
    }

    #[test]
    fn test_underscore() {
        assert_eq!(underscore("user"), "user");
        assert_eq!(underscore("userProfile"), "user_profile");
        assert_eq!(underscore("HTTPServer"), "http_server");
        assert_eq!(underscore("first-name"), "first_name");
        assert_eq!(underscore("post2Comments"), "post2_comments");
        assert_eq!(underscore("UserProfile"), "user_profile");
        assert_eq!(underscore("user profile"), "user_profile");
    }
}
