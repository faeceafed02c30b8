// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layers submitted for composition.
//!
//! A frame is a z-ordered slice of [`Layer`]s, bottom first, whose last entry
//! is the framebuffer target: the surface the GPU composes into for every
//! layer the overlay hardware does not take. The scheduler never mutates the
//! caller's layers; [`FrameInfo::apply_to`](crate::plan::FrameInfo::apply_to)
//! writes the decision back into [`Layer::composition`] when asked.

use core::fmt;

use bitflags::bitflags;
use kurbo::Rect;

/// Identity of a graphics buffer.
///
/// Two layers showing the same buffer carry the same id. The cache treats a
/// changed id as changed content.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct BufferId(pub u64);

impl fmt::Debug for BufferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BufferId({:#x})", self.0)
    }
}

/// Pixel layout of a buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// Packed RGB(A).
    Rgb,
    /// Planar or semi-planar YUV (video).
    Yuv,
}

/// A buffer handle attached to a layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Buffer {
    /// Buffer identity.
    pub id: BufferId,
    /// Pixel layout.
    pub format: PixelFormat,
    /// Protected content that must never be read back by the GPU.
    pub secure: bool,
}

impl Buffer {
    /// A non-secure RGB buffer.
    #[must_use]
    pub const fn rgb(id: u64) -> Self {
        Self {
            id: BufferId(id),
            format: PixelFormat::Rgb,
            secure: false,
        }
    }

    /// A non-secure YUV buffer.
    #[must_use]
    pub const fn yuv(id: u64) -> Self {
        Self {
            id: BufferId(id),
            format: PixelFormat::Yuv,
            secure: false,
        }
    }

    /// Marks the buffer as secure.
    #[must_use]
    pub const fn secure(mut self) -> Self {
        self.secure = true;
        self
    }
}

bitflags! {
    /// Orientation applied when scanning a layer out.
    ///
    /// `ROT_180` and `ROT_270` are the usual flip combinations.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Transform: u8 {
        /// Mirror horizontally.
        const FLIP_H = 1 << 0;
        /// Mirror vertically.
        const FLIP_V = 1 << 1;
        /// Rotate 90° clockwise.
        const ROT_90 = 1 << 2;
        /// Rotate 180°.
        const ROT_180 = Self::FLIP_H.bits() | Self::FLIP_V.bits();
        /// Rotate 270°.
        const ROT_270 = Self::ROT_180.bits() | Self::ROT_90.bits();
    }
}

bitflags! {
    /// Per-layer hints from the window system.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct LayerFlags: u8 {
        /// The layer must be composed by the GPU.
        const SKIP = 1 << 0;
    }
}

/// How a layer's pixels combine with what is below it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Blending {
    /// Opaque copy.
    None,
    /// Premultiplied alpha.
    Premultiplied,
    /// Non-premultiplied (coverage) alpha.
    Coverage,
}

/// Who produces a layer on screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CompositionType {
    /// The GPU draws the layer into the framebuffer target.
    Gpu,
    /// The overlay hardware handles the layer; the GPU must not draw it.
    ///
    /// Also used for framebuffer-composed layers whose pixels are still valid
    /// in the framebuffer target from an earlier frame.
    Overlay,
    /// The framebuffer target itself.
    FramebufferTarget,
}

/// One entry of a frame's z-ordered layer list.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Layer {
    /// Attached buffer, if any. Layers without a buffer are never offloaded.
    pub buffer: Option<Buffer>,
    /// Region of the buffer to sample, in buffer pixels.
    pub source_crop: Rect,
    /// Where the crop lands on the panel, in display pixels.
    pub display_frame: Rect,
    /// Orientation.
    pub transform: Transform,
    /// Blend mode.
    pub blending: Blending,
    /// Plane-wide alpha (255 is opaque).
    pub plane_alpha: u8,
    /// Window-system hints.
    pub flags: LayerFlags,
    /// Composition decision; written back from a [`FrameInfo`](crate::plan::FrameInfo).
    pub composition: CompositionType,
}

impl Layer {
    /// A GPU-composed layer showing `crop` of `buffer` at `frame`.
    #[must_use]
    pub const fn new(buffer: Buffer, source_crop: Rect, display_frame: Rect) -> Self {
        Self {
            buffer: Some(buffer),
            source_crop,
            display_frame,
            transform: Transform::empty(),
            blending: Blending::Premultiplied,
            plane_alpha: u8::MAX,
            flags: LayerFlags::empty(),
            composition: CompositionType::Gpu,
        }
    }

    /// The framebuffer target covering `frame`.
    #[must_use]
    pub const fn framebuffer_target(frame: Rect) -> Self {
        Self {
            buffer: None,
            source_crop: frame,
            display_frame: frame,
            transform: Transform::empty(),
            blending: Blending::Premultiplied,
            plane_alpha: u8::MAX,
            flags: LayerFlags::empty(),
            composition: CompositionType::FramebufferTarget,
        }
    }

    /// Sets the transform.
    #[must_use]
    pub const fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Sets the blend mode.
    #[must_use]
    pub const fn with_blending(mut self, blending: Blending) -> Self {
        self.blending = blending;
        self
    }

    /// Sets the plane alpha.
    #[must_use]
    pub const fn with_plane_alpha(mut self, alpha: u8) -> Self {
        self.plane_alpha = alpha;
        self
    }

    /// Sets the window-system flags.
    #[must_use]
    pub const fn with_flags(mut self, flags: LayerFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Returns `true` for the framebuffer target.
    #[must_use]
    pub const fn is_target(&self) -> bool {
        matches!(self.composition, CompositionType::FramebufferTarget)
    }

    /// Returns `true` if the layer shows a YUV buffer.
    #[must_use]
    pub fn is_video(&self) -> bool {
        self.buffer
            .is_some_and(|b| matches!(b.format, PixelFormat::Yuv))
    }

    /// Returns `true` if the layer shows a secure buffer.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.buffer.is_some_and(|b| b.secure)
    }

    /// Returns `true` if the window system asked for GPU composition.
    #[must_use]
    pub const fn is_skip(&self) -> bool {
        self.flags.contains(LayerFlags::SKIP)
    }

    /// Buffer id, if any.
    #[must_use]
    pub fn buffer_id(&self) -> Option<BufferId> {
        self.buffer.map(|b| b.id)
    }

    /// Returns `true` if the transform includes a 90° rotation.
    #[must_use]
    pub const fn is_rotated_90(&self) -> bool {
        self.transform.contains(Transform::ROT_90)
    }

    /// Returns `true` if blending or plane alpha needs per-pixel scaling.
    #[must_use]
    pub const fn needs_alpha_scale(&self) -> bool {
        !matches!(self.blending, Blending::None) && self.plane_alpha < u8::MAX
    }

    /// Returns `true` if the source crop has integral edges.
    #[must_use]
    pub fn has_integral_crop(&self) -> bool {
        self.source_crop.round() == self.source_crop
    }

    /// Source crop with each edge rounded toward the centre.
    #[must_use]
    pub fn integral_crop(&self) -> Rect {
        self.source_crop.trunc()
    }

    /// Integral crop size as seen after the transform (width and height
    /// swap under a 90° rotation).
    #[must_use]
    pub fn oriented_crop_size(&self) -> (u32, u32) {
        let (w, h) = rect_size(self.integral_crop());
        if self.is_rotated_90() { (h, w) } else { (w, h) }
    }

    /// Returns `true` if the crop is resampled to fit the frame.
    #[must_use]
    pub fn needs_scaling(&self) -> bool {
        self.oriented_crop_size() != rect_size(self.display_frame)
    }

    /// Number of source pixels the layer reads.
    #[must_use]
    pub fn pixel_cost(&self) -> u64 {
        let (w, h) = rect_size(self.integral_crop());
        u64::from(w) * u64::from(h)
    }
}

/// Integral width and height of a rectangle, clamped at zero.
#[must_use]
pub fn rect_size(rect: Rect) -> (u32, u32) {
    (to_pixels(rect.width()), to_pixels(rect.height()))
}

#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "panel coordinates fit in u32; negatives clamp to zero"
)]
fn to_pixels(v: f64) -> u32 {
    if v <= 0.0 { 0 } else { v as u32 }
}
