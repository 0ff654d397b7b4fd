//! Where items go once an engine has had its say.

use serde::Serialize;
use std::fmt;

use crate::item::WorkItem;
use crate::outcome::{Failure, Outcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Success,
    Failure,
    /// Derived artifacts, for processors that keep the original.
    Extracted,
}

impl Channel {
    pub fn as_str(self) -> &'static str {
        match self {
            Channel::Success => "success",
            Channel::Failure => "failure",
            Channel::Extracted => "extracted",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a successful result does to the item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutingMode {
    /// The result becomes the item's content.
    Replace,
    /// The item passes through untouched and the result travels separately
    /// on [`Channel::Extracted`].
    PreserveOriginal,
}

/// One item sent to one channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Transfer {
    pub channel: Channel,
    pub item: WorkItem,
    /// Why the item failed, for transfers on [`Channel::Failure`].
    pub failure: Option<Failure>,
}

impl Transfer {
    fn to(channel: Channel, item: WorkItem) -> Self {
        Self {
            channel,
            item,
            failure: None,
        }
    }
}

pub fn route(outcome: &Outcome) -> Channel {
    match outcome {
        Outcome::Success { .. } => Channel::Success,
        Outcome::Failure(_) => Channel::Failure,
    }
}

/// Expand an outcome into transfers. The primary transfer goes wherever
/// [`route`] says; a failure always carries the original item, unmodified.
pub fn transfers(item: WorkItem, outcome: Outcome, mode: RoutingMode) -> Vec<Transfer> {
    let channel = route(&outcome);
    match outcome {
        Outcome::Failure(failure) => vec![Transfer {
            channel,
            item,
            failure: Some(failure),
        }],
        Outcome::Success { content, metadata } => {
            let derived = item.derive(content).with_attributes(metadata);
            match mode {
                RoutingMode::Replace => vec![Transfer::to(channel, derived)],
                RoutingMode::PreserveOriginal => vec![
                    Transfer::to(channel, item),
                    Transfer::to(Channel::Extracted, derived),
                ],
            }
        }
    }
}
