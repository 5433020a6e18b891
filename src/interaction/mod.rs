//! Interaction controller - routes drag/resize gestures into store mutations
//!
//! Gesture scratch state (drag origin, accumulated delta) lives in
//! [`GestureState`] and is discarded when the gesture ends. Selection is the
//! most recently interacted-with layer.

mod bindings;

pub use bindings::{Binding, BindingRegistry, HeadlessTargets, RenderTargets, TargetHandle};

use serde::{Deserialize, Serialize};

use crate::geometry::{self, Delta, EdgeDelta, GesturePhase, Position, Restriction, Size};
use crate::layer::{LayerId, LayerStore, PlacementStatus};

/// Which part of a layer the pointer went down on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GestureTarget {
    Body,
    ResizeHandle,
}

/// Input delivered by the gesture source
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PointerEvent {
    Down {
        layer: LayerId,
        target: GestureTarget,
    },
    DragMove {
        delta: Delta,
    },
    #[serde(rename_all = "camelCase")]
    ResizeMove {
        rect: Size,
        delta_rect: EdgeDelta,
    },
    Up,
    LayerClick {
        layer: LayerId,
    },
    BackgroundClick,
}

/// Whether an event may continue to the canvas background handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Propagation {
    Continue,
    Stop,
}

/// Edges the resize handle may move. Disabled edges act as fixed anchors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResizeEdges {
    pub left: bool,
    pub top: bool,
}

impl Default for ResizeEdges {
    fn default() -> Self {
        // bottom/right only
        Self {
            left: false,
            top: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragScratch {
    pub layer: LayerId,
    pub origin: Position,
    pub accumulated: Delta,
    pub moved: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeScratch {
    pub layer: LayerId,
}

/// Per-gesture state machine
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum GestureState {
    #[default]
    Idle,
    Dragging(DragScratch),
    Resizing(ResizeScratch),
}

impl GestureState {
    pub fn layer(&self) -> Option<LayerId> {
        match self {
            GestureState::Idle => None,
            GestureState::Dragging(scratch) => Some(scratch.layer),
            GestureState::Resizing(scratch) => Some(scratch.layer),
        }
    }
}

#[derive(Debug)]
pub struct InteractionController {
    restriction: Restriction,
    edges: ResizeEdges,
    state: GestureState,
    selected: Option<LayerId>,
    bindings: BindingRegistry,
}

impl InteractionController {
    pub fn new(restriction: Restriction) -> Self {
        Self {
            restriction,
            edges: ResizeEdges::default(),
            state: GestureState::Idle,
            selected: None,
            bindings: BindingRegistry::new(),
        }
    }

    pub fn with_edges(mut self, edges: ResizeEdges) -> Self {
        self.edges = edges;
        self
    }

    pub fn state(&self) -> &GestureState {
        &self.state
    }

    pub fn selected(&self) -> Option<LayerId> {
        self.selected
    }

    pub fn select(&mut self, id: LayerId) {
        if self.selected != Some(id) {
            tracing::debug!("Selected {}", id);
        }
        self.selected = Some(id);
    }

    pub fn clear_selection(&mut self) {
        if let Some(id) = self.selected.take() {
            tracing::debug!("Cleared selection of {}", id);
        }
    }

    pub fn bindings(&self) -> &BindingRegistry {
        &self.bindings
    }

    /// Attach standing bindings for layers whose targets now exist
    pub fn sync_bindings(&mut self, store: &LayerStore, targets: &dyn RenderTargets) -> usize {
        self.bindings.sync(store, targets)
    }

    pub fn bind(&mut self, id: LayerId, targets: &dyn RenderTargets) -> bool {
        self.bindings.bind(id, targets)
    }

    /// Feed one gesture-source event through the state machine
    pub fn handle(&mut self, store: &mut LayerStore, event: PointerEvent) -> Propagation {
        match event {
            PointerEvent::Down { layer, target } => {
                self.begin(store, layer, target);
                Propagation::Stop
            }
            PointerEvent::DragMove { delta } => {
                self.drag_frame(store, delta);
                Propagation::Stop
            }
            PointerEvent::ResizeMove { rect, delta_rect } => {
                self.resize_frame(store, rect, delta_rect);
                Propagation::Stop
            }
            PointerEvent::Up => {
                self.end(store);
                Propagation::Stop
            }
            PointerEvent::LayerClick { layer } => {
                if store.contains(layer) {
                    self.select(layer);
                }
                Propagation::Stop
            }
            PointerEvent::BackgroundClick => {
                self.clear_selection();
                Propagation::Continue
            }
        }
    }

    fn begin(&mut self, store: &mut LayerStore, id: LayerId, target: GestureTarget) {
        if self.state != GestureState::Idle {
            // A press without a release for the previous gesture
            self.end(store);
        }
        if !self.bindings.is_bound(id) {
            tracing::debug!("Pointer down on unbound {}, ignoring", id);
            return;
        }
        let Some(layer) = store.get(id) else {
            return;
        };

        self.state = match target {
            GestureTarget::Body => GestureState::Dragging(DragScratch {
                layer: id,
                origin: layer.position(),
                accumulated: Delta::ZERO,
                moved: false,
            }),
            GestureTarget::ResizeHandle => GestureState::Resizing(ResizeScratch { layer: id }),
        };
        self.select(id);
        tracing::debug!("Gesture started on {}: {:?}", id, target);
    }

    fn drag_frame(&mut self, store: &mut LayerStore, delta: Delta) {
        let GestureState::Dragging(mut scratch) = self.state else {
            return;
        };
        let Some(layer) = store.get(scratch.layer) else {
            self.state = GestureState::Idle;
            return;
        };

        let next = match layer.placement() {
            PlacementStatus::Unconfirmed => {
                // The creation-time placement is committed verbatim for the
                // first frame; later frames accumulate from it.
                scratch.origin = layer.position();
                scratch.accumulated = Delta::ZERO;
                layer.position()
            }
            PlacementStatus::Confirmed => {
                scratch.accumulated += delta;
                geometry::translate(
                    scratch.origin,
                    layer.size(),
                    scratch.accumulated,
                    &self.restriction,
                    GesturePhase::Move,
                )
            }
        };

        scratch.moved = true;
        store.update_position(scratch.layer, next, true);
        self.state = GestureState::Dragging(scratch);
    }

    fn resize_frame(&mut self, store: &mut LayerStore, rect: Size, delta_rect: EdgeDelta) {
        let GestureState::Resizing(scratch) = self.state else {
            return;
        };
        let Some(layer) = store.get(scratch.layer) else {
            self.state = GestureState::Idle;
            return;
        };

        let edge = EdgeDelta {
            left: if self.edges.left { delta_rect.left } else { 0.0 },
            top: if self.edges.top { delta_rect.top } else { 0.0 },
        };
        let outcome = geometry::resize(rect, edge, store.limits());
        let position = layer.position();

        store.update_size(scratch.layer, outcome.size);
        if outcome.shift != Delta::ZERO {
            store.update_position(scratch.layer, position.offset(outcome.shift), true);
        }
    }

    fn end(&mut self, store: &mut LayerStore) {
        let state = std::mem::take(&mut self.state);
        let GestureState::Dragging(scratch) = state else {
            if let Some(id) = state.layer() {
                tracing::debug!("Gesture ended on {}", id);
            }
            return;
        };
        let Some(layer) = store.get(scratch.layer) else {
            return;
        };

        let committed = geometry::translate(
            scratch.origin,
            layer.size(),
            scratch.accumulated,
            &self.restriction,
            GesturePhase::End,
        );
        if scratch.moved || committed != layer.position() {
            store.update_position(scratch.layer, committed, true);
        }
        tracing::debug!(
            "Drag ended on {} at ({}, {})",
            scratch.layer,
            committed.x,
            committed.y
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geometry::{Rect, RestrictPolicy};
    use crate::layer::ImageSource;

    fn controller() -> InteractionController {
        InteractionController::new(Restriction {
            bounds: Rect::new(0.0, 0.0, 500.0, 500.0),
            policy: RestrictPolicy::EndOnly,
        })
    }

    fn setup(position: Position, size: Size) -> (LayerStore, InteractionController, LayerId) {
        let mut store = LayerStore::new();
        let id = store
            .create_layer(ImageSource::Path("kame.png".into()), position, size)
            .id();
        let mut controller = controller();
        controller.bind(id, &HeadlessTargets);
        (store, controller, id)
    }

    fn drag(
        store: &mut LayerStore,
        controller: &mut InteractionController,
        id: LayerId,
        deltas: &[(f64, f64)],
    ) {
        controller.handle(
            store,
            PointerEvent::Down {
                layer: id,
                target: GestureTarget::Body,
            },
        );
        for (dx, dy) in deltas {
            controller.handle(
                store,
                PointerEvent::DragMove {
                    delta: Delta::new(*dx, *dy),
                },
            );
        }
        controller.handle(store, PointerEvent::Up);
    }

    fn confirmed(position: Position, size: Size) -> (LayerStore, InteractionController, LayerId) {
        let (mut store, controller, id) = setup(position, size);
        store.update_position(id, position, true);
        (store, controller, id)
    }

    #[test]
    fn test_drag_deltas_accumulate_across_gestures() {
        let (mut store, mut controller, id) = confirmed(Position::ORIGIN, Size::new(80.0, 80.0));

        controller.handle(
            &mut store,
            PointerEvent::Down {
                layer: id,
                target: GestureTarget::Body,
            },
        );
        controller.handle(
            &mut store,
            PointerEvent::DragMove {
                delta: Delta::new(10.0, -5.0),
            },
        );
        assert_eq!(store.get(id).unwrap().position(), Position::new(10.0, -5.0));

        controller.handle(
            &mut store,
            PointerEvent::DragMove {
                delta: Delta::new(5.0, 5.0),
            },
        );
        assert_eq!(store.get(id).unwrap().position(), Position::new(15.0, 0.0));

        controller.handle(&mut store, PointerEvent::Up);
        assert_eq!(store.get(id).unwrap().position(), Position::new(15.0, 0.0));
        assert_eq!(*controller.state(), GestureState::Idle);
    }

    #[test]
    fn test_first_frame_of_new_layer_keeps_initial_placement() {
        let (mut store, mut controller, id) =
            setup(Position::new(120.0, 60.0), Size::new(80.0, 80.0));

        drag(&mut store, &mut controller, id, &[(9.0, 9.0)]);
        let layer = store.get(id).unwrap();
        assert_eq!(layer.position(), Position::new(120.0, 60.0));
        assert_eq!(layer.placement(), PlacementStatus::Confirmed);

        drag(&mut store, &mut controller, id, &[(9.0, 9.0), (1.0, 1.0)]);
        assert_eq!(store.get(id).unwrap().position(), Position::new(130.0, 70.0));
    }

    #[test]
    fn test_drag_commits_inside_bounds_at_end() {
        let (mut store, mut controller, id) =
            confirmed(Position::new(400.0, 400.0), Size::new(80.0, 80.0));

        controller.handle(
            &mut store,
            PointerEvent::Down {
                layer: id,
                target: GestureTarget::Body,
            },
        );
        controller.handle(
            &mut store,
            PointerEvent::DragMove {
                delta: Delta::new(200.0, -700.0),
            },
        );
        // Transiently outside while moving
        assert_eq!(store.get(id).unwrap().position(), Position::new(600.0, -300.0));

        controller.handle(&mut store, PointerEvent::Up);
        let layer = store.get(id).unwrap();
        assert_eq!(layer.position(), Position::new(420.0, 0.0));
        assert!(Rect::new(0.0, 0.0, 500.0, 500.0).contains_box(layer.position(), layer.size()));
    }

    #[test]
    fn test_resize_clamps_to_minimum_and_keeps_anchor() {
        let (mut store, mut controller, id) = confirmed(Position::ORIGIN, Size::new(80.0, 80.0));

        controller.handle(
            &mut store,
            PointerEvent::Down {
                layer: id,
                target: GestureTarget::ResizeHandle,
            },
        );
        controller.handle(
            &mut store,
            PointerEvent::ResizeMove {
                rect: Size::new(40.0, 40.0),
                delta_rect: EdgeDelta::default(),
            },
        );
        controller.handle(&mut store, PointerEvent::Up);

        let layer = store.get(id).unwrap();
        assert_eq!(layer.size(), Size::new(50.0, 50.0));
        assert_eq!(layer.position(), Position::ORIGIN);
    }

    #[test]
    fn test_resize_ignores_disabled_edges() {
        let (mut store, mut controller, id) =
            confirmed(Position::new(10.0, 10.0), Size::new(80.0, 80.0));

        controller.handle(
            &mut store,
            PointerEvent::Down {
                layer: id,
                target: GestureTarget::ResizeHandle,
            },
        );
        controller.handle(
            &mut store,
            PointerEvent::ResizeMove {
                rect: Size::new(120.0, 90.0),
                delta_rect: EdgeDelta {
                    left: -40.0,
                    top: -10.0,
                },
            },
        );

        let layer = store.get(id).unwrap();
        assert_eq!(layer.size(), Size::new(120.0, 90.0));
        assert_eq!(layer.position(), Position::new(10.0, 10.0));
    }

    #[test]
    fn test_resize_from_enabled_left_edge_shifts_position() {
        let (mut store, controller, id) =
            confirmed(Position::new(100.0, 100.0), Size::new(80.0, 80.0));
        let mut controller = controller.with_edges(ResizeEdges {
            left: true,
            top: true,
        });

        controller.handle(
            &mut store,
            PointerEvent::Down {
                layer: id,
                target: GestureTarget::ResizeHandle,
            },
        );
        controller.handle(
            &mut store,
            PointerEvent::ResizeMove {
                rect: Size::new(100.0, 80.0),
                delta_rect: EdgeDelta {
                    left: -20.0,
                    top: 0.0,
                },
            },
        );

        let layer = store.get(id).unwrap();
        assert_eq!(layer.size(), Size::new(100.0, 80.0));
        assert_eq!(layer.position(), Position::new(80.0, 100.0));
    }

    #[test]
    fn test_click_selection_policy() {
        let (mut store, mut controller, id) =
            confirmed(Position::new(30.0, 40.0), Size::new(60.0, 60.0));
        let before = store.get(id).unwrap().clone();

        let propagation = controller.handle(&mut store, PointerEvent::LayerClick { layer: id });
        assert_eq!(propagation, Propagation::Stop);
        assert_eq!(controller.selected(), Some(id));

        let propagation = controller.handle(&mut store, PointerEvent::BackgroundClick);
        assert_eq!(propagation, Propagation::Continue);
        assert_eq!(controller.selected(), None);

        controller.handle(&mut store, PointerEvent::LayerClick { layer: id });
        assert_eq!(controller.selected(), Some(id));
        let after = store.get(id).unwrap();
        assert_eq!(after.position(), before.position());
        assert_eq!(after.size(), before.size());
    }

    #[test]
    fn test_gesture_start_selects_layer() {
        let (mut store, mut controller, id) = confirmed(Position::ORIGIN, Size::new(60.0, 60.0));
        controller.handle(
            &mut store,
            PointerEvent::Down {
                layer: id,
                target: GestureTarget::ResizeHandle,
            },
        );
        assert_eq!(controller.selected(), Some(id));
        assert!(matches!(controller.state(), GestureState::Resizing(_)));
    }

    #[test]
    fn test_press_and_release_without_move_leaves_layer_untouched() {
        let (mut store, mut controller, id) =
            confirmed(Position::new(30.0, 40.0), Size::new(60.0, 60.0));
        let before = store.get(id).unwrap().last_modified();

        drag(&mut store, &mut controller, id, &[]);
        assert_eq!(store.get(id).unwrap().last_modified(), before);
    }

    #[test]
    fn test_unbound_layer_ignores_gestures() {
        let mut store = LayerStore::new();
        let id = store
            .create_layer(
                ImageSource::Path("a.png".into()),
                Position::ORIGIN,
                Size::new(60.0, 60.0),
            )
            .id();
        let mut controller = controller();

        controller.handle(
            &mut store,
            PointerEvent::Down {
                layer: id,
                target: GestureTarget::Body,
            },
        );
        assert_eq!(*controller.state(), GestureState::Idle);
        assert_eq!(controller.selected(), None);
    }

    #[test]
    fn test_pointer_event_json_shape() {
        let event: PointerEvent = serde_json::from_value(serde_json::json!({
            "type": "resizeMove",
            "rect": { "width": 40.0, "height": 40.0 },
            "deltaRect": { "left": 0.0, "top": 0.0 }
        }))
        .unwrap();
        assert_eq!(
            event,
            PointerEvent::ResizeMove {
                rect: Size::new(40.0, 40.0),
                delta_rect: EdgeDelta::default(),
            }
        );
    }
}
