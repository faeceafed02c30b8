// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Full offload: every app layer on its own pipe, no GPU composition.

use super::{CompositionStrategy, Infeasible, StrategyInput, finish};
use crate::display::DisplayKind;
use crate::plan::{FrameInfo, StrategyKind};
use crate::resources::HwResources;

/// Puts every app layer on a pipe.
///
/// Rejected on virtual displays, when any layer is skip-flagged or
/// unsupported, when plane alpha is needed without hardware support, for
/// secure content on a secondary display, or when the pipes do not fit.
#[derive(Clone, Copy, Debug, Default)]
pub struct FullOffload;

impl CompositionStrategy for FullOffload {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Full
    }

    fn try_apply(
        &self,
        input: &StrategyInput<'_>,
        hw: &mut HwResources,
    ) -> Result<FrameInfo, Infeasible> {
        let stats = input.stats;
        if input.kind == DisplayKind::Virtual {
            return Err(Infeasible::VirtualDisplay);
        }
        if stats.skip_present() {
            return Err(Infeasible::SkipPresent);
        }
        if stats.needs_alpha_scale && !input.config.supports_alpha_scale {
            return Err(Infeasible::AlphaScaleUnsupported);
        }
        if stats.secure_present && input.kind.is_secondary() {
            return Err(Infeasible::SecureOnSecondary);
        }
        if let Some(i) = input.layers.iter().position(|l| !input.is_supported(l)) {
            return Err(Infeasible::UnsupportedLayer(i));
        }

        let mut frame = FrameInfo::new(input.display, input.layers.len());
        for i in 0..input.layers.len() {
            frame.offload(i);
        }
        frame.map();
        finish(frame, input, hw)
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;
    use crate::layer::{LayerFlags, Transform};
    use crate::pipe::PipeClass;
    use crate::strategy::test_support::{Fixture, hw, ui, video};

    #[test]
    fn ui_and_video_fit() {
        let f = Fixture::new(vec![ui(1, 0.0), video(2)]);
        let mut res = hw(2, 1, 0);
        let plan = FullOffload.try_apply(&f.input(), &mut res).expect("three pipes for two layers");
        assert_eq!(plan.offloaded_count(), 2);
        assert_eq!(plan.fb_z, None);
        assert_eq!(plan.fb_pipes, [None, None]);
        assert_eq!(plan.entry_for(0).and_then(|e| e.pipes[0]).map(|p| p.class), Some(PipeClass::General));
        assert_eq!(plan.entry_for(1).and_then(|e| e.pipes[0]).map(|p| p.class), Some(PipeClass::Video));
        assert!(plan.is_consistent());
    }

    #[test]
    fn skip_layer_rejects() {
        let f = Fixture::new(vec![ui(1, 0.0).with_flags(LayerFlags::SKIP), video(2)]);
        let mut res = hw(4, 4, 0);
        assert_eq!(FullOffload.try_apply(&f.input(), &mut res), Err(Infeasible::SkipPresent));
    }

    #[test]
    fn unsupported_layer_rejects() {
        let f = Fixture::new(vec![ui(1, 0.0), ui(2, 200.0).with_transform(Transform::ROT_90)]);
        let mut res = hw(4, 4, 0);
        assert_eq!(
            FullOffload.try_apply(&f.input(), &mut res),
            Err(Infeasible::UnsupportedLayer(1))
        );
    }

    #[test]
    fn too_many_layers_for_mixer() {
        let layers = (0..5).map(|i| ui(i, 200.0 * i as f64)).collect();
        let f = Fixture::new(layers);
        let mut res = hw(3, 3, 2);
        assert!(matches!(
            FullOffload.try_apply(&f.input(), &mut res),
            Err(Infeasible::PipeBudget { needed: 5, available: 4, .. })
        ));
    }

    #[test]
    fn virtual_display_rejects() {
        let mut f = Fixture::new(vec![ui(1, 0.0)]);
        f.kind = DisplayKind::Virtual;
        let mut res = hw(4, 4, 0);
        assert_eq!(FullOffload.try_apply(&f.input(), &mut res), Err(Infeasible::VirtualDisplay));
    }

    #[test]
    fn alpha_scale_needs_support() {
        let mut f = Fixture::new(vec![ui(1, 0.0).with_plane_alpha(128)]);
        let mut res = hw(4, 4, 0);
        assert!(FullOffload.try_apply(&f.input(), &mut res).is_ok());
        res.release_display(f.input().display);
        f.config.supports_alpha_scale = false;
        assert_eq!(
            FullOffload.try_apply(&f.input(), &mut res),
            Err(Infeasible::AlphaScaleUnsupported)
        );
    }
}
