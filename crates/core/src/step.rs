//! The nine steps of the expenditure chain and their static configuration.
//!
//! Configuration is data, not branching: each step declares who creates,
//! submits, verifies and validates, which step must be validated before
//! it, and how its budget-override policy is set. The workflow engine
//! reads this table and never hard-codes a role name.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::role::Role;

/// Procurement threshold: a passation de marché is only required when
/// the amount reaches this (FCFA).
pub const PROCUREMENT_THRESHOLD: i64 = 5_000_000;

/// DG-validation threshold (FCFA) on the late chain steps.
pub const DG_THRESHOLD: i64 = 50_000_000;

/// One step of the expenditure chain, in chain order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Note sans engagement financier.
    NoteSef,
    /// Note avec engagement financier.
    NoteAef,
    /// Imputation budgétaire: allocation against a budget line.
    Imputation,
    /// Expression de besoin.
    ExpressionBesoin,
    /// Passation de marché (procurement).
    PassationMarche,
    /// Engagement budgétaire: credit reservation.
    Engagement,
    /// Liquidation: service-rendered attestation.
    Liquidation,
    /// Ordonnancement: payment order.
    Ordonnancement,
    /// Règlement: settlement.
    Reglement,
}

/// Per-step budget-override policy.
///
/// Where allowed, submitting over the available budget requires an
/// explicit override flag plus a justification of at least 10 chars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverridePolicy {
    Allowed,
    Denied,
}

/// Static configuration of a chain step.
#[derive(Debug, Clone, Copy)]
pub struct StepConfig {
    /// Module code, e.g. `EXPRESSION_BESOIN`.
    pub code: &'static str,
    /// Short code used in reference numbers, e.g. `EB`.
    pub short_code: &'static str,
    pub label: &'static str,
    /// Roles allowed to create (and delete their own drafts).
    pub creators: &'static [Role],
    /// Roles allowed to submit a draft into the circuit.
    pub submitters: &'static [Role],
    /// Stage-1 roles. For single-stage steps this is the only stage.
    pub verifiers: &'static [Role],
    /// Stage-2 roles (final validation).
    pub validators: &'static [Role],
    /// 1 or 2 validation stages. Single-stage workflows validate
    /// directly on Verify.
    pub stages: u8,
    /// Step that must be validated before a document of this step may
    /// be created/submitted.
    pub prerequisite: Option<Step>,
    /// When true the prerequisite is waived under documented conditions
    /// (NoteAef without a validated NoteSef; procurement below the
    /// threshold).
    pub prerequisite_optional: bool,
    pub override_policy: OverridePolicy,
    /// Amount (FCFA) at which DG validation is additionally required.
    pub dg_threshold: Option<i64>,
}

impl Step {
    pub fn all() -> [Step; 9] {
        [
            Step::NoteSef,
            Step::NoteAef,
            Step::Imputation,
            Step::ExpressionBesoin,
            Step::PassationMarche,
            Step::Engagement,
            Step::Liquidation,
            Step::Ordonnancement,
            Step::Reglement,
        ]
    }

    pub fn config(&self) -> StepConfig {
        use Role::*;
        match self {
            Step::NoteSef => StepConfig {
                code: "NOTE_SEF",
                short_code: "SEF",
                label: "Note sans engagement financier",
                creators: &[Operateur, Agent, ChefService, SousDirecteur, Directeur, Daaf, Dg],
                submitters: &[Operateur, Agent, ChefService, SousDirecteur, Directeur, Daaf],
                verifiers: &[Dg],
                validators: &[Dg],
                stages: 1,
                prerequisite: None,
                prerequisite_optional: false,
                override_policy: OverridePolicy::Denied,
                dg_threshold: None,
            },
            Step::NoteAef => StepConfig {
                code: "NOTE_AEF",
                short_code: "AEF",
                label: "Note avec engagement financier",
                creators: &[Operateur, Agent, ChefService, SousDirecteur, Directeur, Daaf, Dg],
                submitters: &[Operateur, Agent, ChefService, SousDirecteur, Directeur, Daaf],
                verifiers: &[ChefService],
                validators: &[Directeur, Dg],
                stages: 2,
                prerequisite: Some(Step::NoteSef),
                // A note AEF may be opened without a validated note SEF.
                prerequisite_optional: true,
                override_policy: OverridePolicy::Denied,
                dg_threshold: None,
            },
            Step::Imputation => StepConfig {
                code: "IMPUTATION",
                short_code: "IMP",
                label: "Imputation budgétaire",
                creators: &[Cb, Daaf],
                submitters: &[Cb, Daaf],
                verifiers: &[Cb],
                validators: &[Cb],
                stages: 1,
                prerequisite: Some(Step::NoteAef),
                prerequisite_optional: false,
                override_policy: OverridePolicy::Allowed,
                dg_threshold: None,
            },
            Step::ExpressionBesoin => StepConfig {
                code: "EXPRESSION_BESOIN",
                short_code: "EB",
                label: "Expression de besoin",
                creators: &[Operateur, Agent, ChefService, SousDirecteur, Directeur, Daaf],
                submitters: &[Operateur, Agent, ChefService, SousDirecteur, Directeur, Daaf],
                verifiers: &[ChefService],
                validators: &[Directeur, Daaf],
                stages: 2,
                prerequisite: Some(Step::Imputation),
                prerequisite_optional: false,
                override_policy: OverridePolicy::Denied,
                dg_threshold: None,
            },
            Step::PassationMarche => StepConfig {
                code: "PASSATION_MARCHE",
                short_code: "PM",
                label: "Passation de marché",
                creators: &[Daaf, Cb],
                submitters: &[Daaf, Cb],
                verifiers: &[Daaf],
                validators: &[Dg],
                stages: 2,
                prerequisite: Some(Step::ExpressionBesoin),
                // Procurement only applies above the threshold.
                prerequisite_optional: true,
                override_policy: OverridePolicy::Denied,
                dg_threshold: None,
            },
            Step::Engagement => StepConfig {
                code: "ENGAGEMENT",
                short_code: "ENG",
                label: "Engagement budgétaire",
                creators: &[Daaf, Cb],
                submitters: &[Daaf, Cb],
                verifiers: &[Cb],
                validators: &[Cb],
                stages: 1,
                prerequisite: Some(Step::ExpressionBesoin),
                prerequisite_optional: false,
                override_policy: OverridePolicy::Allowed,
                dg_threshold: Some(DG_THRESHOLD),
            },
            Step::Liquidation => StepConfig {
                code: "LIQUIDATION",
                short_code: "LIQ",
                label: "Liquidation",
                creators: &[Daaf, Cb],
                submitters: &[Daaf],
                verifiers: &[Daaf],
                validators: &[Daaf, Dg],
                stages: 2,
                prerequisite: Some(Step::Engagement),
                prerequisite_optional: false,
                override_policy: OverridePolicy::Denied,
                dg_threshold: Some(DG_THRESHOLD),
            },
            Step::Ordonnancement => StepConfig {
                code: "ORDONNANCEMENT",
                short_code: "ORD",
                label: "Ordonnancement",
                creators: &[Daaf],
                submitters: &[Daaf],
                verifiers: &[Daaf],
                validators: &[Dg],
                stages: 2,
                prerequisite: Some(Step::Liquidation),
                prerequisite_optional: false,
                override_policy: OverridePolicy::Denied,
                dg_threshold: Some(DG_THRESHOLD),
            },
            Step::Reglement => StepConfig {
                code: "REGLEMENT",
                short_code: "REG",
                label: "Règlement",
                creators: &[Tresorerie, AgentComptable],
                submitters: &[Tresorerie, AgentComptable],
                verifiers: &[Tresorerie, AgentComptable],
                validators: &[Tresorerie, AgentComptable],
                stages: 1,
                prerequisite: Some(Step::Ordonnancement),
                prerequisite_optional: false,
                override_policy: OverridePolicy::Denied,
                dg_threshold: None,
            },
        }
    }

    pub fn code(&self) -> &'static str {
        self.config().code
    }

    pub fn parse(s: &str) -> Option<Step> {
        let upper = s.to_ascii_uppercase();
        Step::all()
            .into_iter()
            .find(|step| step.config().code == upper || step.config().short_code == upper)
    }

    /// Is the prerequisite waived for a document of this amount?
    ///
    /// Two documented waivers: a note AEF may proceed without a validated
    /// note SEF, and procurement is only required at or above the
    /// procurement threshold.
    pub fn prerequisite_waived(&self, amount: Decimal) -> bool {
        let config = self.config();
        if !config.prerequisite_optional {
            return false;
        }
        match self {
            Step::NoteAef => true,
            Step::PassationMarche => amount < Decimal::from(PROCUREMENT_THRESHOLD),
            _ => false,
        }
    }

    /// Does a document of this amount additionally require DG validation?
    pub fn requires_dg_validation(&self, amount: Decimal) -> bool {
        match self.config().dg_threshold {
            Some(threshold) => amount >= Decimal::from(threshold),
            None => false,
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_is_linear() {
        // Each step after the first names its predecessor (directly or
        // skipping the optional procurement step).
        assert_eq!(Step::NoteSef.config().prerequisite, None);
        assert_eq!(Step::Imputation.config().prerequisite, Some(Step::NoteAef));
        assert_eq!(Step::Reglement.config().prerequisite, Some(Step::Ordonnancement));
    }

    #[test]
    fn single_stage_steps_have_matching_role_sets() {
        for step in Step::all() {
            let config = step.config();
            if config.stages == 1 {
                assert_eq!(config.verifiers, config.validators, "{}", config.code);
            }
        }
    }

    #[test]
    fn procurement_waived_below_threshold() {
        assert!(Step::PassationMarche.prerequisite_waived(Decimal::from(4_999_999)));
        assert!(!Step::PassationMarche.prerequisite_waived(Decimal::from(5_000_000)));
        assert!(!Step::Engagement.prerequisite_waived(Decimal::from(100)));
    }

    #[test]
    fn dg_threshold_on_late_steps() {
        assert!(Step::Liquidation.requires_dg_validation(Decimal::from(50_000_000)));
        assert!(!Step::Liquidation.requires_dg_validation(Decimal::from(49_999_999)));
        assert!(!Step::NoteSef.requires_dg_validation(Decimal::from(1_000_000_000)));
    }

    #[test]
    fn step_parse_accepts_both_codes() {
        assert_eq!(Step::parse("EXPRESSION_BESOIN"), Some(Step::ExpressionBesoin));
        assert_eq!(Step::parse("eb"), Some(Step::ExpressionBesoin));
        assert_eq!(Step::parse("SEF"), Some(Step::NoteSef));
        assert_eq!(Step::parse("FACTURE"), None);
    }
}
