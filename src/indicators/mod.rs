// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free rolling-window indicators used to build chart
// overlays. Every public function returns a series aligned 1:1 with its
// input, with `None` wherever the window exceeds the available history.

pub mod bollinger;
pub mod sma;
