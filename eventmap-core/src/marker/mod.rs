mod focus;
mod grid;
pub(crate) mod reconciler;
mod style;
mod surface;

pub use focus::{FocusOutcome, MapActions, SharedMap};
pub use grid::{Cluster, GridClusterSurface, GridMarker};
pub use reconciler::{
    FocusPhase, FocusStep, FocusTicket, FocusTiming, MarkerReconciler, MarkerSignal,
    ReconcileStats,
};
pub use style::{Legend, MarkerStyle, Recency};
pub use surface::{ClusterId, MapSurface, MarkerSpec, PopupContent};
