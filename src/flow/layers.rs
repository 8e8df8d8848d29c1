use super::classifier::GraphRole;
use super::lifecycle::LifecycleStage;

/// Position of a stage on the layout axis. Stages sort left to right in
/// declaration order; renderers rely on that for monotonic flows.
pub fn stage_layer(stage: LifecycleStage) -> f64 {
    match stage {
        LifecycleStage::PrimaryInput => 0.0,
        LifecycleStage::SecondaryInput => 0.2,
        LifecycleStage::ReusedComponent => 0.8,
        LifecycleStage::Processing => 1.5,
        LifecycleStage::Component => 3.0,
        LifecycleStage::Product => 3.5,
        LifecycleStage::UsePhase => 3.7,
        LifecycleStage::Waste => 4.2,
        LifecycleStage::Disposal => 4.8,
    }
}

pub fn role_layer(role: GraphRole) -> f64 {
    match role {
        GraphRole::Input => 0.0,
        GraphRole::Intermediate => 2.0,
        GraphRole::Output => 3.5,
    }
}

pub fn assign_layer(stage: Option<LifecycleStage>, role: GraphRole) -> f64 {
    match stage {
        Some(stage) => stage_layer(stage),
        None => role_layer(role),
    }
}
