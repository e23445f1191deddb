// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Rider application review.

use crate::db::{Mutation, Precondition, Store};
use crate::error::AppError;
use crate::models::{RiderStatus, UserRole, WorkStatus};
use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct RiderReview {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub modified_count: u64,
    /// False when approval found no user account to promote
    pub user_role_updated: bool,
}

/// Approve or reject a pending rider application.
///
/// Approval also marks the rider available and promotes the user account
/// with the same email to `rider`; both writes land together. A rider that
/// was already reviewed is a conflict, which keeps a rider in delivery from
/// being marked available again.
pub async fn review_application(
    store: &dyn Store,
    rider_id: &str,
    decision: RiderStatus,
) -> Result<RiderReview, AppError> {
    if decision == RiderStatus::Pending {
        return Err(AppError::BadRequest(
            "status must be approved or rejected".to_string(),
        ));
    }

    let mut rider = store
        .get_rider(rider_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("rider {}", rider_id)))?;

    if rider.status != RiderStatus::Pending {
        return Err(AppError::Conflict(format!(
            "rider {} was already {}",
            rider.id,
            rider.status.as_str()
        )));
    }

    let observed = Precondition::rider(&rider);
    rider.status = decision;
    let mut user_role_updated = false;
    let mut mutations = Vec::with_capacity(2);

    if decision == RiderStatus::Approved {
        rider.work_status = WorkStatus::Available;

        match store.find_user_by_email(&rider.email).await? {
            Some(mut user) => {
                user.role = UserRole::Rider;
                mutations.push(Mutation::PutUser(user));
                user_role_updated = true;
            }
            None => {
                tracing::warn!(
                    rider_id,
                    email = %rider.email,
                    "Approved rider has no user account; role not updated"
                );
            }
        }
    }

    let email = rider.email.clone();
    mutations.insert(0, Mutation::PutRider(rider));
    store.commit(vec![observed], mutations).await?;

    tracing::info!(
        rider_id,
        email = %email,
        decision = decision.as_str(),
        user_role_updated,
        "Rider application reviewed"
    );

    Ok(RiderReview {
        modified_count: 1,
        user_role_updated,
    })
}
