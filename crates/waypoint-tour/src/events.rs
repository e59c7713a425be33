#![forbid(unsafe_code)]

//! Tour and step events.

use waypoint_core::HubEvent;

use crate::step::Step;
use crate::tour::Tour;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TourEventKind {
    Start,
    Active,
    Inactive,
    Show,
    Cancel,
    Complete,
}

/// Lifecycle events emitted by a tour and rebroadcast on its
/// [`Registry`](crate::Registry).
#[derive(Debug, Clone)]
pub enum TourEvent {
    Start {
        tour: Tour,
    },
    Active {
        tour: Tour,
    },
    Inactive {
        tour: Tour,
    },
    /// A step is about to be shown; `previous` is the step that was current.
    Show {
        tour: Tour,
        step: Step,
        previous: Option<Step>,
    },
    Cancel {
        tour: Tour,
    },
    Complete {
        tour: Tour,
    },
}

impl TourEvent {
    pub fn tour(&self) -> &Tour {
        match self {
            Self::Start { tour }
            | Self::Active { tour }
            | Self::Inactive { tour }
            | Self::Show { tour, .. }
            | Self::Cancel { tour }
            | Self::Complete { tour } => tour,
        }
    }
}

impl HubEvent for TourEvent {
    type Kind = TourEventKind;

    fn kind(&self) -> TourEventKind {
        match self {
            Self::Start { .. } => TourEventKind::Start,
            Self::Active { .. } => TourEventKind::Active,
            Self::Inactive { .. } => TourEventKind::Inactive,
            Self::Show { .. } => TourEventKind::Show,
            Self::Cancel { .. } => TourEventKind::Cancel,
            Self::Complete { .. } => TourEventKind::Complete,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepEventKind {
    BeforeShow,
    Show,
    BeforeHide,
    Hide,
    Destroy,
}

/// Lifecycle events emitted by a step.
#[derive(Debug, Clone)]
pub struct StepEvent {
    pub kind: StepEventKind,
    pub step: Step,
}

impl HubEvent for StepEvent {
    type Kind = StepEventKind;

    fn kind(&self) -> StepEventKind {
        self.kind
    }
}
