// Copyright (c) 2025 - Cowboy AI, Inc.
//! Milestones
//!
//! Milestones are pushed at most once per instance. The reached flags are
//! served from the milestone cache; a miss replays [`MilestonesWriteModel`].
//!
//! ```text
//! milestones_reached ──hit──→ cached flags
//!                    └─miss─→ replay ─→ set cache ─→ flags
//! ```
//!
//! Commands that reach a milestone append its command to their own push
//! and refresh the cache afterwards.

use tracing::{debug, info, instrument};

use super::Commands;
use crate::aggregate::Aggregate;
use crate::context::CommandContext;
use crate::domain::MilestoneType;
use crate::errors::CommandResult;
use crate::event_store::filter_to_query_reducer;
use crate::events::milestone::MilestoneReached;
use crate::events::{Command, MilestoneEvent};
use crate::write_model::milestone::{MilestoneIndex, MilestonesReached, MilestonesWriteModel};

/// A milestone command waiting for its push, with the flags after it
pub(crate) struct PendingMilestone {
    pub command: Command,
    pub reached: MilestonesReached,
}

impl Commands {
    /// Milestones of the context's instance
    #[instrument(skip_all, fields(instance_id = ctx.instance_id()))]
    pub async fn milestones_reached(&self, ctx: &CommandContext) -> CommandResult<MilestonesReached> {
        let cache = self.milestone_cache();
        if let Some(reached) = cache.get(MilestoneIndex::InstanceId, ctx.instance_id()).await {
            return Ok(reached);
        }

        let mut model = MilestonesWriteModel::new(ctx.instance_id());
        filter_to_query_reducer(ctx, self.store(), &mut model).await?;
        cache.set(model.reached.clone()).await;
        Ok(model.reached)
    }

    /// Push the milestone unless it was already reached
    #[instrument(skip_all, fields(instance_id = ctx.instance_id(), milestone = ?milestone_type))]
    pub async fn milestone_reached(
        &self,
        ctx: &CommandContext,
        milestone_type: MilestoneType,
    ) -> CommandResult<()> {
        let Some(pending) = self.pending_milestone(ctx, milestone_type).await? else {
            debug!("milestone already reached");
            return Ok(());
        };
        self.push(ctx, vec![pending.command]).await?;
        self.milestones_pushed(pending.reached).await;
        info!("milestone reached");
        Ok(())
    }

    pub(crate) async fn pending_milestone(
        &self,
        ctx: &CommandContext,
        milestone_type: MilestoneType,
    ) -> CommandResult<Option<PendingMilestone>> {
        let mut reached = self.milestones_reached(ctx).await?;
        if reached.is_reached(milestone_type) {
            return Ok(None);
        }
        reached.reach(milestone_type);
        Ok(Some(PendingMilestone {
            command: Command::new(
                Aggregate::milestone(ctx.instance_id()),
                MilestoneEvent::Reached(MilestoneReached { milestone_type }),
            ),
            reached,
        }))
    }

    pub(crate) async fn milestones_pushed(&self, reached: MilestonesReached) {
        self.milestone_cache().set(reached).await;
    }
}
