// Check functions for referenced-entity fields
//
// A check decides whether a reference (or its absence) is acceptable for a
// given owner record. AllowedReferences composes the two questions every
// policy asks: may the reference be absent, and which type keys are allowed.
// Different roles on the same record reuse it with their own accessors.

use crate::reference::ReferenceDict;

pub struct AllowedReferences<R> {
    allows_none: fn(&R) -> bool,
    allowed_types: fn(&R) -> &[String],
}

impl<R> AllowedReferences<R> {
    pub fn new(allows_none: fn(&R) -> bool, allowed_types: fn(&R) -> &[String]) -> Self {
        AllowedReferences {
            allows_none,
            allowed_types,
        }
    }

    pub fn allows_none(&self, owner: &R) -> bool {
        (self.allows_none)(owner)
    }

    pub fn allowed_types<'a>(&self, owner: &'a R) -> &'a [String] {
        (self.allowed_types)(owner)
    }

    /// Absence is checked against `allows_none`, a dict against the allowed type keys
    pub fn check(&self, owner: &R, reference: Option<&ReferenceDict>) -> bool {
        match reference {
            None => self.allows_none(owner),
            Some(reference) => self
                .allowed_types(owner)
                .iter()
                .any(|allowed| allowed == reference.type_key()),
        }
    }
}

impl<R> Clone for AllowedReferences<R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for AllowedReferences<R> {}

#[cfg(test)]
mod tests {
    use super::*;

    struct Owner {
        optional: bool,
        types: Vec<String>,
    }

    fn policy() -> AllowedReferences<Owner> {
        AllowedReferences::<Owner>::new(|o| o.optional, |o| o.types.as_slice())
    }

    fn owner(optional: bool, types: &[&str]) -> Owner {
        Owner {
            optional,
            types: types.iter().map(|t| t.to_string()).collect(),
        }
    }

    #[test]
    fn test_absence_follows_allows_none() {
        assert!(policy().check(&owner(true, &["user"]), None));
        assert!(!policy().check(&owner(false, &["user"]), None));
    }

    #[test]
    fn test_type_key_must_be_allowed() {
        let owner = owner(false, &["user", "group"]);

        assert!(policy().check(&owner, Some(&ReferenceDict::new("user", "1"))));
        assert!(policy().check(&owner, Some(&ReferenceDict::new("group", "7"))));
        assert!(!policy().check(&owner, Some(&ReferenceDict::new("community", "3"))));
    }

    #[test]
    fn test_empty_allowed_set_rejects_every_dict() {
        let owner = owner(true, &[]);
        assert!(!policy().check(&owner, Some(&ReferenceDict::new("user", "1"))));
        assert!(policy().check(&owner, None));
    }
}
