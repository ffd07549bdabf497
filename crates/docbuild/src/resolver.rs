/*
 * resolver.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Shape and naming decisions.
//!
//! Pure functions deciding whether data is a single object or a collection,
//! what a selector points at, and what name a nested result is stored under.

use crate::data::Data;
use crate::directive::Selector;
use crate::inflect::{pluralize, singularize};
use crate::scope::Scope;

/// True for ordered collections. Records are never collections.
pub fn is_collection(data: &Data) -> bool {
    matches!(data, Data::List(_))
}

/// True for present, non-collection data.
pub fn is_object(data: &Data) -> bool {
    !data.is_null() && !is_collection(data)
}

/// True if `object` has a member called `name`.
///
/// A member that is present but null still counts as present.
pub fn attribute_present(object: &Data, name: &str) -> bool {
    object.has_member(name)
}

/// Resolve what `selector` points at, relative to the current object.
///
/// Returns `None` when a member/variable name matches nothing; the calling
/// directive is then skipped.
pub fn resolve_selector_value<'a>(
    selector: &'a Selector,
    object: &'a Data,
    scope: &'a dyn Scope,
) -> Option<&'a Data> {
    match selector {
        Selector::Current => Some(object),
        Selector::Member(name) => object.member(name).or_else(|| scope.lookup(name)),
        Selector::Variable(name) => scope.lookup(name),
        Selector::Value(data) => Some(data),
        Selector::Named(inner, _) => resolve_selector_value(inner, object, scope),
    }
}

/// Extra context for naming single objects.
#[derive(Debug, Clone, Copy, Default)]
pub struct NameHints<'a> {
    /// Name of the collection the object belongs to, if any. Its singular
    /// form names the object.
    pub collection_root: Option<&'a str>,
}

/// Derive the name a resolved value is stored under.
///
/// Collections: the explicit override, then the collection's own name, then
/// the pluralized kind of the first element, then the selector token.
///
/// Single objects: the explicit override, then the selector token, then the
/// singular of the enclosing collection's name, then the object's kind.
///
/// Null data has no name.
pub fn derive_name(selector: Option<&Selector>, data: &Data, hints: NameHints<'_>) -> Option<String> {
    if data.is_null() {
        return None;
    }
    if let Some(name) = selector.and_then(Selector::override_name) {
        return Some(name.to_string());
    }
    let token = selector.and_then(Selector::token);

    if let Data::List(list) = data {
        return list
            .name()
            .map(str::to_string)
            .or_else(|| {
                list.first()
                    .and_then(Data::as_record)
                    .and_then(|record| record.kind())
                    .map(pluralize)
            })
            .or_else(|| token.map(str::to_string));
    }

    token
        .map(str::to_string)
        .or_else(|| hints.collection_root.map(singularize))
        .or_else(|| data.as_record().and_then(|record| record.kind()).map(str::to_string))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{DataList, Record};
    use crate::scope::{EmptyScope, MapScope};
    use pretty_assertions::assert_eq;

    fn user(name: &str) -> Data {
        Data::Record(Record::new("user").with_field("name", name))
    }

    fn users() -> Data {
        Data::from(vec![user("leo"), user("ada")])
    }

    #[test]
    fn test_shapes() {
        assert!(is_collection(&users()));
        assert!(!is_collection(&user("leo")));
        assert!(is_object(&user("leo")));
        assert!(is_object(&Data::from(3)));
        assert!(!is_object(&Data::Null));
        assert!(!is_object(&users()));
    }

    #[test]
    fn test_attribute_present() {
        let leo = Data::Record(Record::new("user").with_field("email", Data::Null));
        assert!(attribute_present(&leo, "email"));
        assert!(!attribute_present(&leo, "phone"));
        assert!(!attribute_present(&Data::from("leo"), "len"));
    }

    #[test]
    fn test_resolve_selector_value() {
        let scope = MapScope::new().variable("posts", vec!["a"]);
        let object = Data::Record(
            Record::new("user")
                .with_field("city", "LA")
                .with_field("posts", vec!["mine"]),
        );

        let current = Selector::current();
        assert_eq!(resolve_selector_value(&current, &object, &scope), Some(&object));

        let city = Selector::member("city").named("town");
        assert_eq!(resolve_selector_value(&city, &object, &scope), Some(&Data::from("LA")));

        // members shadow scope variables
        let posts = Selector::member("posts");
        assert_eq!(
            resolve_selector_value(&posts, &object, &scope),
            Some(&Data::from(vec!["mine"]))
        );
        let variable = Selector::variable("posts");
        assert_eq!(
            resolve_selector_value(&variable, &object, &scope),
            Some(&Data::from(vec!["a"]))
        );

        let missing = Selector::member("missing");
        assert_eq!(resolve_selector_value(&missing, &object, &EmptyScope), None);
    }

    #[test]
    fn test_collection_names() {
        let hints = NameHints::default();
        let named = Data::List(DataList::named("people", vec![user("leo")]));

        assert_eq!(
            derive_name(Some(&Selector::current().named("members")), &users(), hints),
            Some("members".to_string())
        );
        assert_eq!(derive_name(None, &named, hints), Some("people".to_string()));
        assert_eq!(derive_name(None, &users(), hints), Some("users".to_string()));
        assert_eq!(
            derive_name(Some(&Selector::member("tags")), &Data::from(vec!["a"]), hints),
            Some("tags".to_string())
        );
    }

    #[test]
    fn test_empty_collection_falls_back_to_token() {
        let empty = Data::from(Vec::<Data>::new());
        assert_eq!(
            derive_name(Some(&Selector::member("posts")), &empty, NameHints::default()),
            Some("posts".to_string())
        );
        assert_eq!(derive_name(None, &empty, NameHints::default()), None);
    }

    #[test]
    fn test_object_names() {
        let leo = user("leo");
        let hints = NameHints {
            collection_root: Some("people"),
        };

        assert_eq!(
            derive_name(Some(&Selector::current().named("person")), &leo, hints),
            Some("person".to_string())
        );
        assert_eq!(
            derive_name(Some(&Selector::member("author")), &leo, hints),
            Some("author".to_string())
        );
        assert_eq!(derive_name(None, &leo, hints), Some("person".to_string()));
        assert_eq!(derive_name(None, &leo, NameHints::default()), Some("user".to_string()));
        assert_eq!(
            derive_name(None, &Data::Record(Record::anonymous()), NameHints::default()),
            None
        );
    }

    #[test]
    fn test_null_has_no_name() {
        assert_eq!(
            derive_name(Some(&Selector::current().named("x")), &Data::Null, NameHints::default()),
            None
        );
    }
}
