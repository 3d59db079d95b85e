//! Property-based tests for `WorkflowService`.

use chrono::Utc;
use proptest::prelude::*;

use docseal_shared::types::{DocumentId, TemplateId, UserId};

use crate::document::{DocumentStatus, DocumentTemplate};
use crate::workflow::error::WorkflowError;
use crate::workflow::service::{TransitionOutcome, WorkflowService};
use crate::workflow::types::{
    Actor, ApprovalPath, Role, Workflow, WorkflowActionKind, WorkflowState,
};

fn arb_role() -> impl Strategy<Value = Role> {
    prop::sample::select(Role::ALL.to_vec())
}

fn arb_path() -> impl Strategy<Value = Vec<Role>> {
    prop::collection::vec(arb_role(), 1..8)
}

fn arb_action() -> impl Strategy<Value = WorkflowActionKind> {
    prop_oneof![
        Just(WorkflowActionKind::Uploaded),
        Just(WorkflowActionKind::Reviewed),
        Just(WorkflowActionKind::Approved),
        Just(WorkflowActionKind::Rejected),
        Just(WorkflowActionKind::Signed),
        Just(WorkflowActionKind::Forwarded),
        Just(WorkflowActionKind::Completed),
    ]
}

fn workflow(roles: Vec<Role>) -> Workflow {
    let template = DocumentTemplate {
        id: TemplateId::new(),
        name: "Property".to_string(),
        document_type: "prop".to_string(),
        approval_path: ApprovalPath::new(roles).unwrap(),
        is_active: true,
        created_at: Utc::now(),
    };
    WorkflowService::instantiate(&template, DocumentId::new()).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Walking a path with the right role at every step completes it in
    /// exactly `len` steps.
    #[test]
    fn prop_matching_roles_complete_path(roles in arb_path()) {
        let mut wf = workflow(roles.clone());
        for (i, role) in roles.iter().enumerate() {
            prop_assert_eq!(wf.current_step as usize, i);
            let t = WorkflowService::plan_advance(
                &wf,
                &Actor::new(UserId::new(), *role),
                WorkflowActionKind::Approved,
            ).unwrap();
            wf = WorkflowService::apply(&wf, &t, Utc::now());
        }
        prop_assert!(wf.is_completed);
        prop_assert_eq!(wf.current_step, wf.total_steps());
        prop_assert_eq!(wf.document_status(), DocumentStatus::Completed);
    }

    /// Any sequence of attempted actions keeps the step counter in range,
    /// monotone, and consistent with `is_completed`.
    #[test]
    fn prop_random_actions_preserve_invariants(
        roles in arb_path(),
        attempts in prop::collection::vec((arb_role(), arb_action()), 0..30),
    ) {
        let mut wf = workflow(roles);
        for (role, action) in attempts {
            let before = wf.clone();
            match WorkflowService::plan_advance(&wf, &Actor::new(UserId::new(), role), action) {
                Ok(t) => {
                    prop_assert_eq!(t.from_step, before.current_step);
                    wf = WorkflowService::apply(&wf, &t, Utc::now());
                    prop_assert!(WorkflowService::is_valid_transition(
                        wf.total_steps(),
                        before.state(),
                        wf.state(),
                    ));
                }
                Err(_) => prop_assert_eq!(&wf, &before),
            }
            prop_assert!(wf.current_step >= before.current_step);
            prop_assert!(wf.current_step <= wf.total_steps());
            prop_assert_eq!(wf.is_completed, wf.current_step == wf.total_steps());
        }
    }

    /// A role other than the step's role is always refused.
    #[test]
    fn prop_wrong_role_is_refused(roles in arb_path(), actor_role in arb_role()) {
        let wf = workflow(roles.clone());
        prop_assume!(actor_role != roles[0]);
        let result = WorkflowService::plan_advance(
            &wf,
            &Actor::new(UserId::new(), actor_role),
            WorkflowActionKind::Approved,
        );
        let is_role_mismatch = matches!(result, Err(WorkflowError::RoleMismatch { .. }));
        prop_assert!(is_role_mismatch);
    }

    /// Rejection is absorbing: nothing is accepted afterwards.
    #[test]
    fn prop_rejection_is_absorbing(
        roles in arb_path(),
        attempts in prop::collection::vec((arb_role(), arb_action()), 1..10),
    ) {
        let wf = workflow(roles.clone());
        let t = WorkflowService::plan_advance(
            &wf,
            &Actor::new(UserId::new(), roles[0]),
            WorkflowActionKind::Rejected,
        ).unwrap();
        prop_assert_eq!(t.outcome, TransitionOutcome::Rejected);
        let wf = WorkflowService::apply(&wf, &t, Utc::now());
        prop_assert_eq!(wf.state(), WorkflowState::Rejected);
        prop_assert_eq!(wf.current_step, 0);

        for (role, action) in attempts {
            let result = WorkflowService::plan_advance(&wf, &Actor::new(UserId::new(), role), action);
            let is_rejected = matches!(result, Err(WorkflowError::AlreadyRejected));
            prop_assert!(is_rejected);
        }
    }
}
