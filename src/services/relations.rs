//! Relationship index: which records point at which

use crate::{
    config::{DeletePolicy, IntegrityConfig},
    models::{EntityKind, RefField, Relation},
};

const AUTHOR_REFERRERS: &[Relation] = &[Relation::new(EntityKind::Book, RefField::Author)];
const GENRE_REFERRERS: &[Relation] = &[Relation::new(EntityKind::Book, RefField::Genre)];
const BOOK_REFERRERS: &[Relation] = &[Relation::new(EntityKind::BookInstance, RefField::Book)];

/// Every declared relation whose target is `kind`
pub fn referrers_of(kind: EntityKind) -> &'static [Relation] {
    match kind {
        EntityKind::Author => AUTHOR_REFERRERS,
        EntityKind::Genre => GENRE_REFERRERS,
        EntityKind::Book => BOOK_REFERRERS,
        EntityKind::BookInstance => &[],
    }
}

/// Relations consulted before a delete, according to the configured policies
#[derive(Debug, Clone)]
pub struct RelationshipIndex {
    policies: IntegrityConfig,
}

impl RelationshipIndex {
    pub fn new(policies: &IntegrityConfig) -> Self {
        Self {
            policies: policies.clone(),
        }
    }

    pub fn policy(&self, kind: EntityKind) -> DeletePolicy {
        self.policies.policy(kind)
    }

    /// Relations that block deleting a `kind` record; empty when deletes are unchecked
    pub fn dependents_of(&self, kind: EntityKind) -> &'static [Relation] {
        match self.policy(kind) {
            DeletePolicy::Restrict => referrers_of(kind),
            DeletePolicy::Unchecked => &[],
        }
    }

    /// Kinds that are referenced by something but deleted without a check
    pub fn unguarded_kinds(&self) -> Vec<EntityKind> {
        EntityKind::ALL
            .into_iter()
            .filter(|kind| !referrers_of(*kind).is_empty() && self.dependents_of(*kind).is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_dependents() {
        let index = RelationshipIndex::new(&IntegrityConfig::default());

        assert_eq!(
            index.dependents_of(EntityKind::Author),
            &[Relation::new(EntityKind::Book, RefField::Author)]
        );
        assert_eq!(
            index.dependents_of(EntityKind::Book),
            &[Relation::new(EntityKind::BookInstance, RefField::Book)]
        );
        assert!(index.dependents_of(EntityKind::Genre).is_empty());
        assert!(index.dependents_of(EntityKind::BookInstance).is_empty());
    }

    #[test]
    fn test_restricted_genre() {
        let config = IntegrityConfig {
            genre: DeletePolicy::Restrict,
        };
        let index = RelationshipIndex::new(&config);

        assert_eq!(
            index.dependents_of(EntityKind::Genre),
            &[Relation::new(EntityKind::Book, RefField::Genre)]
        );
        assert!(index.unguarded_kinds().is_empty());
    }

    #[test]
    fn test_referrers_ignore_policy() {
        let index = RelationshipIndex::new(&IntegrityConfig::default());
        assert_eq!(referrers_of(EntityKind::Genre).len(), 1);
        assert_eq!(index.unguarded_kinds(), vec![EntityKind::Genre]);
    }

    #[test]
    fn test_relation_fields_point_back_at_kind() {
        for kind in EntityKind::ALL {
            for relation in referrers_of(kind) {
                assert_eq!(relation.field.target(), kind);
                assert_eq!(relation.field.owner(), relation.child);
            }
        }
    }
}
