//! Enumeration of the actions an actor may attempt on a document.
//!
//! This answers "what buttons light up": it combines the transition
//! table with the actor's capabilities at the document's step. Guards
//! that depend on runtime inputs (motif length, budget availability)
//! are not consulted here; an offered action can still be refused by
//! `attempt_transition`.

use chaine_core::{Action, Actor, Document};

use crate::transition::{actor_may, rule_for};

const OFFERED: [Action; 7] = [
    Action::Submit,
    Action::Verify,
    Action::Validate,
    Action::Reject,
    Action::Defer,
    Action::Resume,
    Action::Delete,
];

/// Actions the actor could legally attempt on the document right now.
pub fn available_actions(document: &Document, actor: &Actor) -> Vec<Action> {
    OFFERED
        .iter()
        .copied()
        .filter(|&action| {
            rule_for(document.status, action)
                .is_some_and(|rule| actor_may(rule, document, actor))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chaine_core::{Role, Status, Step};
    use rust_decimal::Decimal;

    fn doc(status: Status) -> Document {
        let mut d = Document::draft(
            "eb-1",
            Step::ExpressionBesoin,
            Decimal::from(1000),
            "BL-01",
            "u-agent",
            2026,
        );
        d.status = status;
        d
    }

    fn actor(id: &str, role: Role) -> Actor {
        Actor::new(id, vec![role])
    }

    #[test]
    fn creator_sees_submit_and_delete_on_draft() {
        let d = doc(Status::Draft);
        let creator = actor("u-agent", Role::Agent);
        assert_eq!(
            available_actions(&d, &creator),
            vec![Action::Submit, Action::Delete]
        );
        // Another agent at the same step may submit, but not delete.
        let other = actor("u-other", Role::Agent);
        assert_eq!(available_actions(&d, &other), vec![Action::Submit]);
    }

    #[test]
    fn verifier_sees_stage_one_actions_on_submitted() {
        let d = doc(Status::Submitted);
        let chef = actor("u-chef", Role::ChefService);
        let offered = available_actions(&d, &chef);
        assert!(offered.contains(&Action::Verify));
        assert!(offered.contains(&Action::Reject));
        assert!(offered.contains(&Action::Defer));
        assert!(!offered.contains(&Action::Validate));
        assert!(!offered.contains(&Action::Submit));
    }

    #[test]
    fn validator_sees_stage_two_actions_on_verified() {
        let d = doc(Status::Verified);
        let daaf = actor("u-daaf", Role::Daaf);
        let offered = available_actions(&d, &daaf);
        assert!(offered.contains(&Action::Validate));
        assert!(offered.contains(&Action::Reject));
        // A stage-one verifier no longer holds reject at stage two.
        let chef = actor("u-chef", Role::ChefService);
        let offered = available_actions(&d, &chef);
        assert!(!offered.contains(&Action::Validate));
        assert!(!offered.contains(&Action::Reject));
    }

    #[test]
    fn terminal_statuses_offer_nothing() {
        let admin = actor("u-admin", Role::Admin);
        assert!(available_actions(&doc(Status::Validated), &admin).is_empty());
        assert!(available_actions(&doc(Status::Rejected), &admin).is_empty());
    }

    #[test]
    fn deferred_offers_only_resume() {
        let d = doc(Status::Deferred);
        let admin = actor("u-admin", Role::Admin);
        assert_eq!(available_actions(&d, &admin), vec![Action::Resume]);
        // An actor with no circuit role gets nothing.
        let outsider = actor("u-out", Role::Auditeur);
        assert!(available_actions(&d, &outsider).is_empty());
    }
}
