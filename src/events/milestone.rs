// Copyright (c) 2025 - Cowboy AI, Inc.
//! Milestone Events

use serde::{Deserialize, Serialize};

use crate::domain::MilestoneType;

pub const REACHED: &str = "milestone.reached";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MilestoneEvent {
    Reached(MilestoneReached),
}

impl MilestoneEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            MilestoneEvent::Reached(_) => REACHED,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneReached {
    pub milestone_type: MilestoneType,
}
