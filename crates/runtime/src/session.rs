//! Render session - pass lifecycle and the cooperative work loop
//!
//! One session renders declarative descriptions into a materializer, one
//! pass at a time:
//!
//! ```text
//! Idle → Building (render() creates the pass root)
//!      → Draining (tick() processes units until the turn budget runs out,
//!                  across as many turns as the host grants)
//!      → Committing (tree exhausted: one attach walk, then publish)
//!      → Idle (or straight into the next queued pass)
//! ```
//!
//! All state lives on the session; there are no globals and no threads.
//! Renders that arrive while a pass is in flight are queued and run in
//! order after it commits - in-flight work is never discarded.

use std::collections::VecDeque;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};
use uuid::Uuid;

use fiber::{work, Description, Fiber, FiberArena, FiberId, HandleId, Materializer};

use crate::error::{Result, SessionError};
use crate::events::{EventBus, PassId, RenderEvent};
use crate::host::{Deadline, Unconstrained};

/// Session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Yield when the turn's remaining time drops below this threshold.
    /// One unit of work is always processed per tick regardless, so a host
    /// that reports zero remaining time cannot starve the engine.
    pub min_remaining: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            min_remaining: Duration::from_millis(1),
        }
    }
}

/// Outcome of one scheduler tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickStatus {
    /// Nothing left to do; the host need not re-register
    Idle,
    /// Work remains (units, an uncommitted pass, or queued renders);
    /// the host should grant another turn
    Pending,
}

/// The in-flight render pass
struct RenderPass {
    id: PassId,
    arena: FiberArena,
    root: FiberId,
    container: HandleId,
    next_unit: Option<FiberId>,
    units_done: usize,
}

/// A render that arrived while another pass was in flight
struct QueuedRender {
    id: PassId,
    description: Description,
    container: HandleId,
}

/// The last successfully committed tree
///
/// Kept alive so the next pass can record alternates against it; its
/// `arena` is the namespace for their `FiberId`s.
pub struct CommittedTree {
    pub pass: PassId,
    pub arena: FiberArena,
    pub root: FiberId,
    pub container: HandleId,
}

/// Render session over a materializer
///
/// Single-threaded and cooperative: every mutation happens inside a
/// `render()` or `tick()` call, and a tick only ever pauses between whole
/// units of work.
pub struct RenderSession<M: Materializer> {
    materializer: M,
    config: SessionConfig,
    pass: Option<RenderPass>,
    committed: Option<CommittedTree>,
    queue: VecDeque<QueuedRender>,
    events: EventBus,
}

impl<M: Materializer> RenderSession<M> {
    /// Create a session with default config
    pub fn new(materializer: M) -> Self {
        Self::with_config(materializer, SessionConfig::default())
    }

    /// Create a session with custom config
    pub fn with_config(materializer: M, config: SessionConfig) -> Self {
        Self {
            materializer,
            config,
            pass: None,
            committed: None,
            queue: VecDeque::new(),
            events: EventBus::new(),
        }
    }

    /// Request a render of `description` into `container`.
    ///
    /// Returns immediately with the pass id; the work happens across
    /// subsequent [`tick`](Self::tick) calls. If a pass is already in
    /// flight the request is queued and starts after that pass commits.
    pub fn render(&mut self, description: Description, container: HandleId) -> PassId {
        let id = Uuid::now_v7();
        if self.pass.is_some() || !self.queue.is_empty() {
            debug!(pass = %id, queued = self.queue.len() + 1, "render queued behind in-flight pass");
            self.queue.push_back(QueuedRender {
                id,
                description,
                container,
            });
            self.events.publish(RenderEvent::PassQueued { pass: id });
        } else {
            self.start_pass(id, description, container);
        }
        id
    }

    /// Run one scheduler turn against the host-supplied deadline.
    ///
    /// Processes at least one unit of work, then keeps going until the
    /// remaining time drops below the configured threshold. When the tree
    /// is exhausted the pass commits in the same turn. Returns
    /// [`TickStatus::Pending`] whenever the host should grant another turn.
    pub fn tick(&mut self, deadline: &dyn Deadline) -> Result<TickStatus> {
        if self.pass.is_none() {
            match self.queue.pop_front() {
                Some(queued) => self.start_pass(queued.id, queued.description, queued.container),
                None => return Ok(TickStatus::Idle),
            }
        }
        let Some(mut pass) = self.pass.take() else {
            return Ok(TickStatus::Idle);
        };

        while let Some(unit) = pass.next_unit {
            match work::advance(&mut pass.arena, unit, &mut self.materializer) {
                Ok(next) => {
                    pass.next_unit = next;
                    pass.units_done += 1;
                }
                Err(source) => return Err(self.abort(pass, source)),
            }
            if deadline.time_remaining() < self.config.min_remaining {
                break;
            }
        }

        if pass.next_unit.is_some() {
            trace!(pass = %pass.id, units = pass.units_done, "yielding with work remaining");
            self.events.publish(RenderEvent::PassYielded {
                pass: pass.id,
                units_done: pass.units_done,
            });
            self.pass = Some(pass);
            return Ok(TickStatus::Pending);
        }

        self.commit(pass)?;

        if let Some(queued) = self.queue.pop_front() {
            self.start_pass(queued.id, queued.description, queued.container);
            return Ok(TickStatus::Pending);
        }
        Ok(TickStatus::Idle)
    }

    /// Drain all pending and queued work with an unconstrained deadline
    pub fn run_to_idle(&mut self) -> Result<()> {
        while self.tick(&Unconstrained)? == TickStatus::Pending {}
        Ok(())
    }

    /// Subscribe to lifecycle events
    pub fn subscribe(&mut self) -> std::sync::mpsc::Receiver<RenderEvent> {
        self.events.subscribe()
    }

    /// The last committed tree, if any pass has completed
    pub fn committed(&self) -> Option<&CommittedTree> {
        self.committed.as_ref()
    }

    /// True when no pass is in flight and nothing is queued
    pub fn is_idle(&self) -> bool {
        self.pass.is_none() && self.queue.is_empty()
    }

    /// Number of renders waiting behind the in-flight pass
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Get reference to the materializer
    pub fn materializer(&self) -> &M {
        &self.materializer
    }

    /// Get mutable reference to the materializer
    pub fn materializer_mut(&mut self) -> &mut M {
        &mut self.materializer
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    fn start_pass(&mut self, id: PassId, description: Description, container: HandleId) {
        let mut arena = FiberArena::new();
        let alternate = self.committed.as_ref().map(|tree| tree.root);
        let root = arena.add(Fiber::pass_root(container, description, alternate));
        arena.set_root(root);

        debug!(pass = %id, "render pass started");
        self.pass = Some(RenderPass {
            id,
            arena,
            root,
            container,
            next_unit: Some(root),
            units_done: 0,
        });
        self.events.publish(RenderEvent::PassStarted { pass: id });
    }

    /// Attach the completed tree and publish it as current. The committed
    /// tree is reassigned exactly once per pass, here, after the full walk.
    fn commit(&mut self, pass: RenderPass) -> Result<()> {
        match work::commit_tree(&pass.arena, pass.root, &mut self.materializer) {
            Ok(attached) => {
                debug!(
                    pass = %pass.id,
                    fibers = pass.arena.len(),
                    attached,
                    "render pass committed"
                );
                self.events.publish(RenderEvent::PassCommitted {
                    pass: pass.id,
                    fiber_count: pass.arena.len(),
                });
                self.committed = Some(CommittedTree {
                    pass: pass.id,
                    arena: pass.arena,
                    root: pass.root,
                    container: pass.container,
                });
                Ok(())
            }
            Err(source) => Err(self.abort(pass, source)),
        }
    }

    /// Discard the pending pass; the committed tree stays untouched
    fn abort(&mut self, pass: RenderPass, source: fiber::FiberError) -> SessionError {
        warn!(pass = %pass.id, error = %source, "render pass aborted");
        self.events.publish(RenderEvent::PassFailed {
            pass: pass.id,
            reason: source.to_string(),
        });
        SessionError::PassAborted {
            pass: pass.id,
            source,
        }
    }
}

impl<M: Materializer + Default> Default for RenderSession<M> {
    fn default() -> Self {
        Self::new(M::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::Exhausted;
    use fiber::{
        FiberError, NodeKind, OutputSerializer, PropValue, Props, TreeMaterializer, VALUE_PROP,
    };

    fn sample() -> Description {
        Description::element(
            "div",
            Props::new().with("id", "a"),
            vec![Description::element("span", Props::new(), vec!["hi".into()])],
        )
    }

    #[test]
    fn test_render_scenario_to_completion() {
        let mut session = RenderSession::new(TreeMaterializer::new());
        let container = session.materializer_mut().container();

        session.render(sample(), container);
        session.run_to_idle().unwrap();

        let mat = session.materializer();
        let top = mat.children_of(container).unwrap();
        assert_eq!(top.len(), 1);
        let div = top[0];
        assert_eq!(div.kind, NodeKind::Element("div".to_string()));
        assert_eq!(div.props.get("id"), Some(&PropValue::Text("a".to_string())));

        let spans = mat.children_of(div.id).unwrap();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].kind, NodeKind::Element("span".to_string()));

        let texts = mat.children_of(spans[0].id).unwrap();
        assert_eq!(texts.len(), 1);
        assert!(texts[0].is_text());
        assert_eq!(
            texts[0].props.get(VALUE_PROP),
            Some(&PropValue::Text("hi".to_string()))
        );
    }

    #[test]
    fn test_render_returns_before_any_work() {
        let mut session = RenderSession::new(TreeMaterializer::new());
        let container = session.materializer_mut().container();

        session.render(sample(), container);

        // Only the container exists until the scheduler runs
        assert_eq!(session.materializer().len(), 1);
        assert!(!session.is_idle());
    }

    #[test]
    fn test_chunked_output_matches_unconstrained() {
        let serializer = OutputSerializer::new();

        let mut whole = RenderSession::new(TreeMaterializer::new());
        let whole_container = whole.materializer_mut().container();
        whole.render(sample(), whole_container);
        whole.run_to_idle().unwrap();
        let expected = serializer
            .serialize(whole.materializer(), whole_container)
            .unwrap();

        let mut chunked = RenderSession::new(TreeMaterializer::new());
        let chunked_container = chunked.materializer_mut().container();
        chunked.render(sample(), chunked_container);

        let mut ticks = 0;
        while chunked.tick(&Exhausted).unwrap() == TickStatus::Pending {
            ticks += 1;
            assert!(ticks < 100, "scheduler failed to make progress");
        }
        // Zero-budget turns force one unit per tick; 4 fibers need 4 units
        assert!(ticks >= 3);

        let actual = serializer
            .serialize(chunked.materializer(), chunked_container)
            .unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_zero_budget_host_cannot_starve_the_engine() {
        let mut session = RenderSession::new(TreeMaterializer::new());
        let container = session.materializer_mut().container();
        session.render(sample(), container);

        // 4 fibers (pass root + div + span + text): the pass must finish in
        // at most one tick per unit even with no time budget at all
        for _ in 0..5 {
            if session.tick(&Exhausted).unwrap() == TickStatus::Idle {
                break;
            }
        }
        assert!(session.is_idle());
        assert!(session.committed().is_some());
    }

    #[test]
    fn test_idle_tick_is_a_noop() {
        let mut session = RenderSession::new(TreeMaterializer::new());
        let container = session.materializer_mut().container();
        session.render(sample(), container);
        session.run_to_idle().unwrap();

        let nodes_after_commit = session.materializer().len();
        assert_eq!(session.tick(&Unconstrained).unwrap(), TickStatus::Idle);
        assert_eq!(session.tick(&Exhausted).unwrap(), TickStatus::Idle);
        // No re-commit, no double-attach, no new nodes
        assert_eq!(session.materializer().len(), nodes_after_commit);
        assert_eq!(
            session
                .materializer()
                .children_of(container)
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn test_overlapping_renders_queue_in_order() {
        let mut session = RenderSession::new(TreeMaterializer::new());
        let first_container = session.materializer_mut().container();
        let second_container = session.materializer_mut().container();
        let events = session.subscribe();

        let first = session.render(sample(), first_container);
        // Partially drain, then request a second render mid-pass
        session.tick(&Exhausted).unwrap();
        let second = session.render(
            Description::element("p", Props::new(), vec!["later".into()]),
            second_container,
        );
        assert_eq!(session.queued(), 1);

        session.run_to_idle().unwrap();

        // Both passes ran, in order; the committed tree is the second one
        let committed = session.committed().unwrap();
        assert_eq!(committed.pass, second);
        assert_eq!(committed.container, second_container);

        let first_top = session.materializer().children_of(first_container).unwrap();
        assert_eq!(first_top[0].kind, NodeKind::Element("div".to_string()));
        let second_top = session
            .materializer()
            .children_of(second_container)
            .unwrap();
        assert_eq!(second_top[0].kind, NodeKind::Element("p".to_string()));

        let order: Vec<RenderEvent> = events.try_iter().collect();
        let commits: Vec<PassId> = order
            .iter()
            .filter_map(|e| match e {
                RenderEvent::PassCommitted { pass, .. } => Some(*pass),
                _ => None,
            })
            .collect();
        assert_eq!(commits, vec![first, second]);
    }

    #[test]
    fn test_committed_tree_records_alternate_root() {
        let mut session = RenderSession::new(TreeMaterializer::new());
        let container = session.materializer_mut().container();

        session.render(sample(), container);
        session.run_to_idle().unwrap();
        let first_root = session.committed().unwrap().root;

        session.render(sample(), container);
        session.run_to_idle().unwrap();

        let committed = session.committed().unwrap();
        let root = committed.arena.get(committed.root).unwrap();
        assert_eq!(root.alternate, Some(first_root));
    }

    /// Materializer that refuses to create "bomb" nodes
    struct Fused(TreeMaterializer);

    impl Materializer for Fused {
        fn create(&mut self, kind: &NodeKind) -> fiber::Result<HandleId> {
            if kind.tag() == "bomb" {
                return Err(FiberError::Materialization("fuse blown".to_string()));
            }
            self.0.create(kind)
        }
        fn set_prop(
            &mut self,
            handle: HandleId,
            name: &str,
            value: &PropValue,
        ) -> fiber::Result<()> {
            self.0.set_prop(handle, name, value)
        }
        fn attach(&mut self, parent: HandleId, child: HandleId) -> fiber::Result<()> {
            self.0.attach(parent, child)
        }
    }

    #[test]
    fn test_materializer_failure_aborts_pass_and_keeps_committed_tree() {
        let mut session = RenderSession::new(Fused(TreeMaterializer::new()));
        let container = session.materializer_mut().0.container();
        let events = session.subscribe();

        let good = session.render(sample(), container);
        session.run_to_idle().unwrap();
        let good_children = session
            .materializer()
            .0
            .children_of(container)
            .unwrap()
            .len();

        let bad_container = session.materializer_mut().0.container();
        let bad = session.render(
            Description::element("bomb", Props::new(), vec![]),
            bad_container,
        );
        let err = session.run_to_idle().unwrap_err();
        match err {
            SessionError::PassAborted { pass, .. } => assert_eq!(pass, bad),
        }

        // The committed tree and its output are untouched
        assert_eq!(session.committed().unwrap().pass, good);
        assert_eq!(
            session
                .materializer()
                .0
                .children_of(container)
                .unwrap()
                .len(),
            good_children
        );
        assert!(session.is_idle());

        // The session keeps working afterwards
        let retry_container = session.materializer_mut().0.container();
        session.render(sample(), retry_container);
        session.run_to_idle().unwrap();
        assert_eq!(
            session
                .materializer()
                .0
                .children_of(retry_container)
                .unwrap()
                .len(),
            1
        );

        let failed: Vec<PassId> = events
            .try_iter()
            .filter_map(|e| match e {
                RenderEvent::PassFailed { pass, .. } => Some(pass),
                _ => None,
            })
            .collect();
        assert_eq!(failed, vec![bad]);
    }

    #[test]
    fn test_render_description_parsed_from_json() {
        let raw = serde_json::json!({
            "kind": "nav",
            "props": { "role": "menu" },
            "children": [
                { "kind": "item", "children": ["first"] },
                { "kind": "item", "children": ["second"] }
            ]
        });
        let description = Description::from_json(&raw).unwrap();

        let mut session = RenderSession::new(TreeMaterializer::new());
        let container = session.materializer_mut().container();
        session.render(description, container);
        session.run_to_idle().unwrap();

        let mat = session.materializer();
        let nav = mat.children_of(container).unwrap()[0];
        assert_eq!(
            nav.props.get("role"),
            Some(&PropValue::Text("menu".to_string()))
        );
        assert_eq!(mat.children_of(nav.id).unwrap().len(), 2);
    }

    #[test]
    fn test_each_pass_commits_exactly_once() {
        let mut session = RenderSession::new(TreeMaterializer::new());
        let container = session.materializer_mut().container();
        let events = session.subscribe();

        let pass = session.render(sample(), container);
        let mut guard = 0;
        while session.tick(&Exhausted).unwrap() == TickStatus::Pending {
            guard += 1;
            assert!(guard < 100);
        }

        let commits = events
            .try_iter()
            .filter(|e| matches!(e, RenderEvent::PassCommitted { pass: p, .. } if *p == pass))
            .count();
        assert_eq!(commits, 1);
    }
}
