//! Animated single-unit transfers between transfer points.
//!
//! A [`TransferOperation`] is created already configured: its endpoints,
//! duration, payload and completion [`Delivery`] are fixed at construction.
//! Each `update` advances the timer, interpolates the payload between the
//! freshly resolved source and destination, and once the duration has
//! elapsed hands back the delivery exactly once. The owner polls
//! [`TransferOperation::is_completed`] and drops the operation afterwards.
//! There is no cancellation.

use crate::fixed::{Seconds, progress_ratio};
use crate::id::{BlockId, TransferPoint};
use crate::placement::{Locator, LocatorResolver, Placement};

/// What happens when an operation finishes: `block` is added to `to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    pub block: BlockId,
    pub to: TransferPoint,
}

/// Result of one `update` call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransferStep {
    /// New world placement for the payload, when both endpoints resolved.
    pub placement: Option<Placement>,
    /// Set on the completing update only.
    pub delivery: Option<Delivery>,
}

#[derive(Debug, Clone)]
pub struct TransferOperation {
    source: Locator,
    destination: Locator,
    duration: Seconds,
    payload: BlockId,
    to: TransferPoint,
    on_complete: Option<Delivery>,
    elapsed: Seconds,
    completed: bool,
}

impl TransferOperation {
    pub fn new(
        source: Locator,
        destination: Locator,
        duration: Seconds,
        payload: BlockId,
        to: TransferPoint,
    ) -> Self {
        Self {
            source,
            destination,
            duration,
            payload,
            to,
            on_complete: Some(Delivery { block: payload, to }),
            elapsed: Seconds::ZERO,
            completed: false,
        }
    }

    /// Advance the animation. No-op once completed.
    ///
    /// The interpolation factor is clamped to `[0, 1]`, so the completing
    /// update places the payload exactly on the destination.
    pub fn update<R>(&mut self, dt: Seconds, resolver: &R) -> TransferStep
    where
        R: LocatorResolver + ?Sized,
    {
        if self.completed {
            return TransferStep::default();
        }

        self.elapsed += dt;
        let t = progress_ratio(self.elapsed, self.duration).clamp(0.0, 1.0);

        let source = resolver.resolve(&self.source);
        let destination = resolver.resolve(&self.destination);
        let mut step = TransferStep {
            placement: match (source, destination) {
                (Some(from), Some(to)) => Some(from.lerp(&to, t)),
                _ => None,
            },
            delivery: None,
        };

        if self.elapsed >= self.duration {
            self.completed = true;
            if destination.is_some() {
                step.placement = destination;
            }
            step.delivery = self.on_complete.take();
        }

        step
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn payload(&self) -> BlockId {
        self.payload
    }

    /// The point the payload is heading to.
    pub fn target(&self) -> TransferPoint {
        self.to
    }

    pub fn elapsed(&self) -> Seconds {
        self.elapsed
    }

    pub fn duration(&self) -> Seconds {
        self.duration
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed::seconds;
    use crate::id::StorageId;
    use crate::placement::DetachedResolver;
    use glam::Vec3;
    use slotmap::SlotMap;
    use std::cell::Cell;
    use std::rc::Rc;

    fn ids() -> (BlockId, StorageId) {
        let mut blocks = SlotMap::<BlockId, ()>::with_key();
        let mut storages = SlotMap::<StorageId, ()>::with_key();
        (blocks.insert(()), storages.insert(()))
    }

    fn op(duration: f64) -> TransferOperation {
        let (block, storage) = ids();
        TransferOperation::new(
            Locator::Fixed(Placement::at(Vec3::ZERO)),
            Locator::Fixed(Placement::at(Vec3::new(10.0, 0.0, 0.0))),
            seconds(duration),
            block,
            TransferPoint::Storage(storage),
        )
    }

    #[test]
    fn interpolates_position_each_tick() {
        let mut transfer = op(1.0);
        let step = transfer.update(seconds(0.25), &DetachedResolver);
        let placement = step.placement.unwrap();
        assert!((placement.position.x - 2.5).abs() < 1e-5);
        assert!(step.delivery.is_none());
        assert!(!transfer.is_completed());
    }

    #[test]
    fn delivers_exactly_once_after_duration() {
        let mut transfer = op(0.5);
        let mut deliveries = 0;
        for _ in 0..10 {
            let step = transfer.update(seconds(0.125), &DetachedResolver);
            if step.delivery.is_some() {
                deliveries += 1;
                assert!(transfer.elapsed() >= transfer.duration());
            }
        }
        assert_eq!(deliveries, 1);
        assert!(transfer.is_completed());
    }

    #[test]
    fn never_delivers_before_duration() {
        let mut transfer = op(0.5);
        for _ in 0..3 {
            assert!(transfer.update(seconds(0.125), &DetachedResolver).delivery.is_none());
        }
        assert!(transfer.update(seconds(0.125), &DetachedResolver).delivery.is_some());
    }

    #[test]
    fn overshooting_frame_lands_on_destination() {
        let mut transfer = op(0.5);
        let step = transfer.update(seconds(2.0), &DetachedResolver);
        assert_eq!(step.placement.unwrap().position, Vec3::new(10.0, 0.0, 0.0));
        assert!(step.delivery.is_some());
    }

    #[test]
    fn moving_destination_is_reevaluated() {
        let (block, storage) = ids();
        let target_x = Rc::new(Cell::new(10.0f32));
        let tx = Rc::clone(&target_x);
        let mut transfer = TransferOperation::new(
            Locator::Fixed(Placement::IDENTITY),
            Locator::Dynamic(Rc::new(move || Placement::at(Vec3::new(tx.get(), 0.0, 0.0)))),
            seconds(1.0),
            block,
            TransferPoint::Storage(storage),
        );

        transfer.update(seconds(0.5), &DetachedResolver);
        target_x.set(20.0);
        let step = transfer.update(seconds(0.25), &DetachedResolver);
        assert!((step.placement.unwrap().position.x - 15.0).abs() < 1e-4);
    }

    #[test]
    fn update_after_completion_is_noop() {
        let mut transfer = op(0.5);
        transfer.update(seconds(0.5), &DetachedResolver);
        let step = transfer.update(seconds(0.5), &DetachedResolver);
        assert_eq!(step, TransferStep::default());
        assert_eq!(transfer.elapsed(), seconds(0.5));
    }

    #[test]
    fn delivery_targets_configured_point() {
        let (block, storage) = ids();
        let mut transfer = TransferOperation::new(
            Locator::Fixed(Placement::IDENTITY),
            Locator::StorageSlot(storage),
            seconds(0.5),
            block,
            TransferPoint::Storage(storage),
        );
        assert_eq!(transfer.target(), TransferPoint::Storage(storage));
        // The detached resolver cannot place a storage slot, but the timer
        // still runs and the delivery is still handed back.
        let step = transfer.update(seconds(0.5), &DetachedResolver);
        assert!(step.placement.is_none());
        assert_eq!(step.delivery, Some(Delivery { block, to: TransferPoint::Storage(storage) }));
        assert_eq!(transfer.target(), TransferPoint::Storage(storage));
    }
}
