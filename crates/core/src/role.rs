//! Role taxonomy and capability checks.
//!
//! Capabilities are checked through a single pure function,
//! [`actor_has_capability`], driven by the per-step role matrix in
//! [`StepConfig`](crate::step::StepConfig). Role names never appear in
//! transition logic; only capabilities do, so the role taxonomy can
//! change without touching the engine.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::step::Step;

/// Functional roles of the organisation.
///
/// Serialized to the uppercase codes the production user profiles carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "ADMIN")]
    Admin,
    /// Directeur Général -- final validation authority.
    #[serde(rename = "DG")]
    Dg,
    /// Direction Administrative et Financière.
    #[serde(rename = "DAAF")]
    Daaf,
    /// Contrôleur Budgétaire -- first-level budget verification.
    #[serde(rename = "CB")]
    Cb,
    #[serde(rename = "DIRECTEUR")]
    Directeur,
    #[serde(rename = "SOUS_DIRECTEUR")]
    SousDirecteur,
    #[serde(rename = "CHEF_SERVICE")]
    ChefService,
    #[serde(rename = "TRESORERIE")]
    Tresorerie,
    #[serde(rename = "AGENT_COMPTABLE")]
    AgentComptable,
    /// Read-only audit access; holds no workflow capability.
    #[serde(rename = "AUDITEUR")]
    Auditeur,
    #[serde(rename = "OPERATEUR")]
    Operateur,
    #[serde(rename = "AGENT")]
    Agent,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Dg => "DG",
            Role::Daaf => "DAAF",
            Role::Cb => "CB",
            Role::Directeur => "DIRECTEUR",
            Role::SousDirecteur => "SOUS_DIRECTEUR",
            Role::ChefService => "CHEF_SERVICE",
            Role::Tresorerie => "TRESORERIE",
            Role::AgentComptable => "AGENT_COMPTABLE",
            Role::Auditeur => "AUDITEUR",
            Role::Operateur => "OPERATEUR",
            Role::Agent => "AGENT",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s.to_ascii_uppercase().as_str() {
            "ADMIN" => Some(Role::Admin),
            "DG" => Some(Role::Dg),
            "DAAF" => Some(Role::Daaf),
            "CB" => Some(Role::Cb),
            "DIRECTEUR" => Some(Role::Directeur),
            "SOUS_DIRECTEUR" => Some(Role::SousDirecteur),
            "CHEF_SERVICE" => Some(Role::ChefService),
            "TRESORERIE" => Some(Role::Tresorerie),
            "AGENT_COMPTABLE" => Some(Role::AgentComptable),
            "AUDITEUR" => Some(Role::Auditeur),
            "OPERATEUR" => Some(Role::Operateur),
            "AGENT" => Some(Role::Agent),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A workflow capability at a given chain step.
///
/// Transitions name a required capability; which roles hold it at which
/// step is a pure data question answered by the step's role matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Create,
    Submit,
    /// First-level verification (stage 1 of a two-stage workflow, the
    /// only stage of a single-stage one).
    Verify,
    /// Final validation (stage 2).
    Validate,
    Reject,
    Defer,
    Resume,
    Delete,
}

/// The identity attempting a transition: user id plus role set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub roles: Vec<Role>,
}

impl Actor {
    pub fn new(id: impl Into<String>, roles: Vec<Role>) -> Self {
        Actor {
            id: id.into(),
            roles,
        }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }
}

/// Does `actor` hold `capability` at `step`?
///
/// Admin passes every check. Everyone else is matched against the step's
/// role matrix. Resume is open to any actor holding at least one
/// workflow capability at the step (creator-side or validator-side).
pub fn actor_has_capability(actor: &Actor, step: Step, capability: Capability) -> bool {
    if actor.is_admin() {
        return true;
    }
    let config = step.config();
    let roles: &[Role] = match capability {
        Capability::Create | Capability::Delete => config.creators,
        Capability::Submit => config.submitters,
        Capability::Verify => config.verifiers,
        Capability::Validate => config.validators,
        // Reject/defer belong to whoever can act on the document at its
        // current stage; the engine picks Verify or Validate based on the
        // stage, so either side suffices here.
        Capability::Reject | Capability::Defer => {
            return actor.roles.iter().any(|r| {
                config.verifiers.contains(r) || config.validators.contains(r)
            });
        }
        Capability::Resume => {
            return actor.roles.iter().any(|r| {
                config.submitters.contains(r)
                    || config.verifiers.contains(r)
                    || config.validators.contains(r)
            });
        }
    };
    actor.roles.iter().any(|r| roles.contains(r))
}
