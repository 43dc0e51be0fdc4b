use std::collections::{BTreeMap, BTreeSet};

use crate::config::EngineConfig;
use crate::geometry::{GeometrySource, ObservedTarget, ObserverId};
use crate::ir::PanelId;
use crate::layout::{FishboneLayout, LayoutPass, collect_input, compute_pass, exceeds_tolerance};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameHandle(pub u64);

/// Single-shot deferred callback with cancel-and-replace semantics
/// (an animation frame, a timer or a microtask on the host side).
pub trait FrameClock {
    fn request_frame(&mut self) -> FrameHandle;
    fn cancel_frame(&mut self, handle: FrameHandle);
}

/// Frame clock driven by hand: requested frames stay pending until taken.
#[derive(Debug, Default)]
pub struct ManualClock {
    next: u64,
    pending: BTreeSet<FrameHandle>,
    cancelled: usize,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> impl Iterator<Item = FrameHandle> + '_ {
        self.pending.iter().copied()
    }

    /// Drains the frames that are due, oldest first.
    pub fn take_due(&mut self) -> Vec<FrameHandle> {
        std::mem::take(&mut self.pending).into_iter().collect()
    }

    pub fn cancelled_count(&self) -> usize {
        self.cancelled
    }
}

impl FrameClock for ManualClock {
    fn request_frame(&mut self) -> FrameHandle {
        self.next += 1;
        let handle = FrameHandle(self.next);
        self.pending.insert(handle);
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if self.pending.remove(&handle) {
            self.cancelled += 1;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    Mount,
    ContainerResize,
    SourceResize,
    PanelResize(PanelId),
    WindowResize,
    Scroll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    ScheduledNextFrame(FrameHandle),
}

/// Owns the offset accumulators. Geometry changes are reported with
/// [`RecomputeScheduler::notify`], which replaces any pending frame; running
/// the frame computes one pass and updates the snapshot only when something
/// moved by more than the jitter tolerance.
///
/// ```
/// use fishbone_layout::config::EngineConfig;
/// use fishbone_layout::geometry::{Rect, SnapshotGeometry};
/// use fishbone_layout::scheduler::{ManualClock, RecomputeScheduler, Trigger};
///
/// let geometry = SnapshotGeometry::new(
///     Rect::new(0.0, 0.0, 800.0, 400.0),
///     Rect::new(600.0, 100.0, 120.0, 60.0),
/// )
/// .with_category("MAN", Rect::new(50.0, 20.0, 100.0, 80.0));
///
/// let mut scheduler = RecomputeScheduler::new(geometry, ManualClock::new(), EngineConfig::default());
/// scheduler.mount();
/// scheduler.notify(Trigger::WindowResize);
///
/// // Only the latest request survives.
/// let due = scheduler.clock_mut().take_due();
/// assert_eq!(due.len(), 1);
/// assert!(scheduler.run_frame(due[0]));
/// assert!(scheduler.layout().spine.is_some());
/// ```
pub struct RecomputeScheduler<G, C>
where
    G: GeometrySource,
    C: FrameClock,
{
    geometry: G,
    clock: C,
    config: EngineConfig,
    state: SchedulerState,
    category_offsets: BTreeMap<PanelId, f32>,
    source_offset: f32,
    layout: FishboneLayout,
    frame_observers: Vec<ObserverId>,
    panel_observers: BTreeMap<PanelId, ObserverId>,
    mounted: bool,
    torn_down: bool,
}

impl<G, C> RecomputeScheduler<G, C>
where
    G: GeometrySource,
    C: FrameClock,
{
    pub fn new(geometry: G, clock: C, config: EngineConfig) -> Self {
        Self {
            geometry,
            clock,
            config,
            state: SchedulerState::Idle,
            category_offsets: BTreeMap::new(),
            source_offset: 0.0,
            layout: FishboneLayout::empty(),
            frame_observers: Vec::new(),
            panel_observers: BTreeMap::new(),
            mounted: false,
            torn_down: false,
        }
    }

    /// Starts observing the container, window, source and visible panels and
    /// schedules the first pass.
    pub fn mount(&mut self) {
        if self.mounted || self.torn_down {
            return;
        }
        for target in [
            ObservedTarget::Container,
            ObservedTarget::ContainerScroll,
            ObservedTarget::Window,
            ObservedTarget::Source,
        ] {
            let id = self.geometry.observe(target);
            self.frame_observers.push(id);
        }
        self.mounted = true;
        self.sync_panel_observers();
        self.notify(Trigger::Mount);
    }

    pub fn notify(&mut self, trigger: Trigger) {
        if self.torn_down {
            tracing::trace!(?trigger, "ignored trigger after teardown");
            return;
        }
        if let SchedulerState::ScheduledNextFrame(pending) = self.state {
            self.clock.cancel_frame(pending);
        }
        let handle = self.clock.request_frame();
        tracing::trace!(?trigger, frame = handle.0, "recompute scheduled");
        self.state = SchedulerState::ScheduledNextFrame(handle);
    }

    /// Runs the frame identified by `handle`. Stale or cancelled handles are
    /// ignored. Returns whether the layout snapshot changed.
    pub fn run_frame(&mut self, handle: FrameHandle) -> bool {
        match self.state {
            SchedulerState::ScheduledNextFrame(pending) if pending == handle => {}
            _ => {
                tracing::trace!(frame = handle.0, "stale frame ignored");
                return false;
            }
        }
        self.state = SchedulerState::Idle;
        self.recompute()
    }

    /// Runs the pending frame right away, if there is one.
    pub fn flush(&mut self) -> bool {
        let SchedulerState::ScheduledNextFrame(pending) = self.state else {
            return false;
        };
        self.clock.cancel_frame(pending);
        self.state = SchedulerState::Idle;
        self.recompute()
    }

    /// Cancels the pending frame and releases every observer. Later triggers
    /// are ignored.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        if let SchedulerState::ScheduledNextFrame(pending) = self.state {
            self.clock.cancel_frame(pending);
        }
        self.state = SchedulerState::Idle;
        for id in self.frame_observers.drain(..) {
            self.geometry.unobserve(id);
        }
        for (_, id) in std::mem::take(&mut self.panel_observers) {
            self.geometry.unobserve(id);
        }
        self.torn_down = true;
        tracing::debug!("fishbone layout torn down");
    }

    pub fn layout(&self) -> &FishboneLayout {
        &self.layout
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted && !self.torn_down
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn geometry(&self) -> &G {
        &self.geometry
    }

    /// Host-side access for updating the measured world. Call [`Self::notify`]
    /// afterwards so the change is picked up.
    pub fn geometry_mut(&mut self) -> &mut G {
        &mut self.geometry
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    fn recompute(&mut self) -> bool {
        self.sync_panel_observers();

        let pass = collect_input(&self.geometry, &self.category_offsets)
            .map(|input| compute_pass(&input, &self.config))
            .unwrap_or_default();

        let mut next = if pass.is_empty() {
            self.clear_accumulators()
        } else {
            self.commit(pass)
        };

        let changed = !next.same_content(&self.layout);
        if changed {
            next.revision = self.layout.revision + 1;
            tracing::debug!(
                revision = next.revision,
                connectors = next.connectors.len(),
                spine_y = next.spine.map(|spine| spine.y),
                source_offset = next.source_offset,
                "fishbone layout updated"
            );
            self.layout = next;
        }
        changed
    }

    fn clear_accumulators(&mut self) -> FishboneLayout {
        self.category_offsets.clear();
        self.source_offset = 0.0;
        FishboneLayout::empty()
    }

    /// Folds a pass into the accumulators. An offset is rewritten only when it
    /// moves by more than the tolerance; panels missing from the pass are
    /// forgotten.
    fn commit(&mut self, pass: LayoutPass) -> FishboneLayout {
        let tolerance = self.config.jitter_tolerance;
        let mut offsets = BTreeMap::new();
        for offset in pass.category_offsets {
            let previous = self.category_offsets.get(&offset.id).copied().unwrap_or(0.0);
            let value = if exceeds_tolerance(offset.dx - previous, tolerance) {
                offset.dx
            } else {
                previous
            };
            offsets.insert(offset.id, value);
        }
        self.category_offsets = offsets;
        self.source_offset += pass.source_offset_delta;

        FishboneLayout {
            spine: pass.spine,
            connectors: pass.connectors,
            source_link: pass.source_link,
            category_offsets: self.category_offsets.clone(),
            source_offset: self.source_offset,
            revision: self.layout.revision,
        }
    }

    fn sync_panel_observers(&mut self) {
        if !self.mounted || self.torn_down {
            return;
        }
        let visible: BTreeSet<PanelId> = self
            .geometry
            .visible_categories()
            .into_iter()
            .map(|category| category.id)
            .collect();

        let gone: Vec<PanelId> = self
            .panel_observers
            .keys()
            .filter(|id| !visible.contains(*id))
            .cloned()
            .collect();
        for id in gone {
            if let Some(observer) = self.panel_observers.remove(&id) {
                self.geometry.unobserve(observer);
            }
        }
        for id in visible {
            if !self.panel_observers.contains_key(&id) {
                let observer = self.geometry.observe(ObservedTarget::Category(id.clone()));
                self.panel_observers.insert(id, observer);
            }
        }
    }
}

impl<G, C> Drop for RecomputeScheduler<G, C>
where
    G: GeometrySource,
    C: FrameClock,
{
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Rect, SnapshotGeometry};

    fn box_at(center_x: f32, top: f32, height: f32) -> Rect {
        Rect::new(center_x - 50.0, top, 100.0, height)
    }

    fn geometry() -> SnapshotGeometry {
        SnapshotGeometry::new(
            Rect::new(0.0, 0.0, 800.0, 400.0),
            Rect::new(612.0, 170.0, 150.0, 60.0),
        )
        .with_category("T1", box_at(100.0, 20.0, 100.0))
        .with_category("T2", box_at(300.0, 30.0, 100.0))
        .with_category("T3", box_at(500.0, 10.0, 110.0))
        .with_category("B1", box_at(150.0, 220.0, 100.0))
        .with_category("B2", box_at(450.0, 240.0, 100.0))
    }

    fn scheduler() -> RecomputeScheduler<SnapshotGeometry, ManualClock> {
        RecomputeScheduler::new(geometry(), ManualClock::new(), EngineConfig::default())
    }

    /// Runs every due frame, then lets the host apply the snapshot.
    fn pump(scheduler: &mut RecomputeScheduler<SnapshotGeometry, ManualClock>) -> bool {
        let mut changed = false;
        for handle in scheduler.clock_mut().take_due() {
            changed |= scheduler.run_frame(handle);
        }
        let layout = scheduler.layout().clone();
        scheduler.geometry_mut().apply_layout(&layout);
        changed
    }

    #[test]
    fn mount_observes_everything_and_schedules() {
        let mut scheduler = scheduler();
        scheduler.mount();
        // container, scroll, window, source and five panels
        assert_eq!(scheduler.geometry().observer_count(), 9);
        assert!(matches!(scheduler.state(), SchedulerState::ScheduledNextFrame(_)));
        assert!(pump(&mut scheduler));
        assert_eq!(scheduler.state(), SchedulerState::Idle);
        assert_eq!(scheduler.layout().revision, 1);
    }

    #[test]
    fn bursts_coalesce_into_one_frame() {
        let mut scheduler = scheduler();
        scheduler.mount();
        scheduler.notify(Trigger::ContainerResize);
        scheduler.notify(Trigger::Scroll);
        scheduler.notify(Trigger::PanelResize("T1".into()));
        assert_eq!(scheduler.clock().cancelled_count(), 3);
        let due = scheduler.clock_mut().take_due();
        assert_eq!(due.len(), 1);
        assert!(scheduler.run_frame(due[0]));
    }

    #[test]
    fn stale_frames_are_ignored() {
        let mut scheduler = scheduler();
        scheduler.mount();
        let first = scheduler.clock().pending().next().expect("frame");
        scheduler.notify(Trigger::WindowResize);
        assert!(!scheduler.run_frame(first));
        assert!(scheduler.layout().is_empty());
    }

    #[test]
    fn stable_geometry_reaches_fixed_point() {
        let mut scheduler = scheduler();
        scheduler.mount();
        assert!(pump(&mut scheduler));
        let settled = scheduler.layout().clone();
        assert_eq!(settled.source_offset, -25.0);

        for _ in 0..3 {
            scheduler.notify(Trigger::Scroll);
            assert!(!pump(&mut scheduler));
        }
        assert_eq!(scheduler.layout(), &settled);
        let link = settled.source_link.expect("link");
        assert!(!link.has_jog());
    }

    #[test]
    fn sub_tolerance_moves_do_not_rewrite_offsets() {
        let mut scheduler = scheduler();
        scheduler.mount();
        pump(&mut scheduler);
        let before = scheduler.layout().category_offset(&"B1".into());

        scheduler
            .geometry_mut()
            .set_category("B1".into(), box_at(150.3, 220.0, 100.0));
        scheduler.notify(Trigger::PanelResize("B1".into()));
        pump(&mut scheduler);
        assert_eq!(scheduler.layout().category_offset(&"B1".into()), before);
    }

    #[test]
    fn offset_change_of_exactly_the_tolerance_is_kept() {
        let mut scheduler = scheduler();
        scheduler.mount();
        pump(&mut scheduler);
        assert_eq!(scheduler.layout().category_offset(&"B1".into()), 50.0);

        // B1's slot moves from 200 to (101 + 300) / 2 = 200.5.
        scheduler
            .geometry_mut()
            .set_category("T1".into(), box_at(101.0, 20.0, 100.0));
        scheduler.notify(Trigger::PanelResize("T1".into()));
        pump(&mut scheduler);
        assert_eq!(scheduler.layout().category_offset(&"B1".into()), 50.0);

        scheduler
            .geometry_mut()
            .set_category("T1".into(), box_at(102.0, 20.0, 100.0));
        scheduler.notify(Trigger::PanelResize("T1".into()));
        pump(&mut scheduler);
        assert_eq!(scheduler.layout().category_offset(&"B1".into()), 51.0);
    }

    #[test]
    fn losing_every_panel_clears_layout_and_offsets() {
        let mut scheduler = scheduler();
        scheduler.mount();
        pump(&mut scheduler);
        assert!(scheduler.layout().source_offset != 0.0);

        for id in ["T1", "T2", "T3", "B1", "B2"] {
            scheduler.geometry_mut().remove_category(&id.into());
        }
        scheduler.notify(Trigger::ContainerResize);
        assert!(pump(&mut scheduler));
        let layout = scheduler.layout();
        assert!(layout.spine.is_none());
        assert!(layout.connectors.is_empty());
        assert!(layout.source_link.is_none());
        assert!(layout.category_offsets.is_empty());
        assert_eq!(layout.source_offset, 0.0);
        // panel observers released, frame observers kept
        assert_eq!(scheduler.geometry().observer_count(), 4);
    }

    #[test]
    fn vanished_panel_is_forgotten() {
        let mut scheduler = scheduler();
        scheduler.mount();
        pump(&mut scheduler);
        assert!(scheduler.layout().category_offsets.contains_key(&PanelId::from("B1")));

        scheduler.geometry_mut().remove_category(&"B1".into());
        scheduler.notify(Trigger::ContainerResize);
        pump(&mut scheduler);
        assert!(!scheduler.layout().category_offsets.contains_key(&PanelId::from("B1")));
        assert!(scheduler.layout().connector(&"B1".into()).is_none());
        assert!(!scheduler
            .geometry()
            .is_observed(&ObservedTarget::Category("B1".into())));
    }

    #[test]
    fn unmounted_source_yields_empty_layout() {
        let mut scheduler = scheduler();
        scheduler.geometry_mut().source = None;
        scheduler.mount();
        pump(&mut scheduler);
        assert!(scheduler.layout().is_empty());
    }

    #[test]
    fn teardown_releases_observers_and_pending_frame() {
        let mut scheduler = scheduler();
        scheduler.mount();
        scheduler.teardown();
        assert_eq!(scheduler.geometry().observer_count(), 0);
        assert_eq!(scheduler.clock().pending().count(), 0);
        assert!(!scheduler.is_mounted());

        scheduler.notify(Trigger::WindowResize);
        assert_eq!(scheduler.state(), SchedulerState::Idle);
        assert!(!scheduler.flush());
    }

    #[test]
    fn flush_runs_pending_frame_immediately() {
        let mut scheduler = scheduler();
        scheduler.mount();
        assert!(scheduler.flush());
        assert_eq!(scheduler.clock().pending().count(), 0);
        assert!(!scheduler.flush());
    }
}
