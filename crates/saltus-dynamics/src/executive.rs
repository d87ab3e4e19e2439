//! The [`Executive`] trait and its structural-change context.

use saltus_core::{Bag, DynamicsError, ModelId, ObservationEvent, OutputEvents, SimTime, Value};
use saltus_graph::ModelGraph;

use crate::change::{ChangeSet, CouplingSpec, StructuralChange};
use crate::dynamics::Dynamics;

/// Behavior of an atomic model that may restructure its own coupled
/// model mid-run.
///
/// The hooks mirror [`Dynamics`] with one addition: init and the
/// transition hooks receive an [`ExecutiveContext`] giving read
/// access to the live graph and a queue for structural changes.
/// Changes are scoped to the executive's own coupled model and take
/// effect at the current time, after the step's transition phase;
/// they never retroactively affect events already routed.
///
/// An executive participates in scheduling like any other atomic
/// model: it has a time advance, outputs, and receives external
/// events, which is how models ask it for structural changes.
pub trait Executive: Send + 'static {
    /// Called once when the executive enters the simulation. Returns
    /// the first time advance.
    ///
    /// Default: [`SimTime::INFINITY`] (start passive).
    fn init(
        &mut self,
        _time: SimTime,
        _ctx: &mut ExecutiveContext<'_>,
    ) -> Result<SimTime, DynamicsError> {
        Ok(SimTime::INFINITY)
    }

    /// Duration until the next internal transition.
    ///
    /// Default: [`SimTime::INFINITY`].
    fn time_advance(&self) -> SimTime {
        SimTime::INFINITY
    }

    /// Collect emissions for the current instant.
    ///
    /// Default: emits nothing.
    fn output(&self, _time: SimTime, _output: &mut OutputEvents) -> Result<(), DynamicsError> {
        Ok(())
    }

    /// The scheduled internal transition fired with no external
    /// events at the same instant.
    fn internal_transition(
        &mut self,
        _time: SimTime,
        _ctx: &mut ExecutiveContext<'_>,
    ) -> Result<(), DynamicsError> {
        Ok(())
    }

    /// External events arrived while the executive was not imminent.
    fn external_transition(
        &mut self,
        _bag: &Bag,
        _time: SimTime,
        _ctx: &mut ExecutiveContext<'_>,
    ) -> Result<(), DynamicsError> {
        Ok(())
    }

    /// Imminent and receiving external events at the same instant.
    ///
    /// Default: internal first, then external.
    fn confluent_transition(
        &mut self,
        time: SimTime,
        bag: &Bag,
        ctx: &mut ExecutiveContext<'_>,
    ) -> Result<(), DynamicsError> {
        self.internal_transition(time, ctx)?;
        self.external_transition(bag, time, ctx)
    }

    /// Answer an observation request from current state.
    ///
    /// Default: nothing observable.
    fn observation(&self, _event: &ObservationEvent) -> Option<Box<dyn Value>> {
        None
    }

    /// Called exactly once when the run terminates.
    fn finish(&mut self) {}
}

/// What an executive sees during a hook: the live graph, read-only,
/// and the change queue its requests go into.
///
/// Constructed by the engine around each executive hook invocation.
/// Every queued change is scoped to [`coupled`](ExecutiveContext::coupled),
/// the coupled model this executive belongs to; an executive cannot
/// restructure anything outside it.
pub struct ExecutiveContext<'a> {
    graph: &'a ModelGraph,
    coupled: ModelId,
    time: SimTime,
    changes: &'a mut ChangeSet,
}

impl<'a> ExecutiveContext<'a> {
    /// Wrap the state for one hook invocation.
    pub fn new(
        graph: &'a ModelGraph,
        coupled: ModelId,
        time: SimTime,
        changes: &'a mut ChangeSet,
    ) -> Self {
        Self {
            graph,
            coupled,
            time,
            changes,
        }
    }

    /// The live model graph, as of the start of this step's change
    /// application. Changes queued here are not yet visible.
    pub fn graph(&self) -> &ModelGraph {
        self.graph
    }

    /// The coupled model this executive can restructure.
    pub fn coupled(&self) -> ModelId {
        self.coupled
    }

    /// The current simulation time.
    pub fn time(&self) -> SimTime {
        self.time
    }

    /// Queue an atomic model addition under the coupled model.
    ///
    /// The new model is initialized at the current time when the
    /// change applies; it does not replay history.
    pub fn add_atomic(
        &mut self,
        name: impl Into<String>,
        input_ports: &[&str],
        output_ports: &[&str],
        build: impl FnOnce() -> Box<dyn Dynamics> + Send + 'static,
    ) {
        self.changes.push(
            self.coupled,
            StructuralChange::AddModel {
                name: name.into(),
                input_ports: input_ports.iter().map(|p| p.to_string()).collect(),
                output_ports: output_ports.iter().map(|p| p.to_string()).collect(),
                build: Box::new(build),
            },
        );
    }

    /// Queue removal of a direct child by leaf name.
    pub fn remove_model(&mut self, name: impl Into<String>) {
        self.changes.push(
            self.coupled,
            StructuralChange::RemoveModel { name: name.into() },
        );
    }

    /// Queue a coupling addition described by leaf names.
    ///
    /// Names resolve per [`CouplingSpec`]: the coupled model's own
    /// name denotes its boundary ports, anything else a direct child.
    pub fn connect(
        &mut self,
        source: impl Into<String>,
        source_port: impl Into<String>,
        target: impl Into<String>,
        target_port: impl Into<String>,
    ) {
        self.changes.push(
            self.coupled,
            StructuralChange::Connect(CouplingSpec {
                source: source.into(),
                source_port: source_port.into(),
                target: target.into(),
                target_port: target_port.into(),
            }),
        );
    }

    /// Queue removal of the first coupling matching the description.
    pub fn disconnect(
        &mut self,
        source: impl Into<String>,
        source_port: impl Into<String>,
        target: impl Into<String>,
        target_port: impl Into<String>,
    ) {
        self.changes.push(
            self.coupled,
            StructuralChange::Disconnect(CouplingSpec {
                source: source.into(),
                source_port: source_port.into(),
                target: target.into(),
                target_port: target_port.into(),
            }),
        );
    }

    /// Queue an arbitrary change, scoped to this executive's coupled
    /// model.
    pub fn queue(&mut self, change: StructuralChange) {
        self.changes.push(self.coupled, change);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_scopes_changes_to_its_coupled_model() {
        let graph = ModelGraph::new("top").unwrap();
        let coupled = graph.root();
        let mut changes = ChangeSet::new();

        let mut ctx = ExecutiveContext::new(&graph, coupled, SimTime::ZERO, &mut changes);
        assert_eq!(ctx.coupled(), coupled);
        assert_eq!(ctx.time(), SimTime::ZERO);
        assert_eq!(ctx.graph().model_count(), 1);

        ctx.remove_model("worker");
        ctx.connect("gen", "out", "sink", "in");

        let drained = changes.drain();
        assert_eq!(drained.len(), 2);
        assert!(drained.iter().all(|entry| entry.scope == coupled));
        match &drained[1].change {
            StructuralChange::Connect(spec) => {
                assert_eq!(spec.source, "gen");
                assert_eq!(spec.target_port, "in");
            }
            other => panic!("expected Connect, got {other:?}"),
        }
    }

    #[test]
    fn default_executive_is_passive() {
        struct Idle;
        impl Executive for Idle {}

        let graph = ModelGraph::new("top").unwrap();
        let mut changes = ChangeSet::new();
        let mut ctx = ExecutiveContext::new(&graph, graph.root(), SimTime::ZERO, &mut changes);

        let mut exec = Idle;
        assert_eq!(
            exec.init(SimTime::ZERO, &mut ctx).unwrap(),
            SimTime::INFINITY
        );
        assert_eq!(exec.time_advance(), SimTime::INFINITY);
        assert!(changes.is_empty());
    }
}
