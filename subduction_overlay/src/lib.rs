// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-frame display composition scheduling across shared overlay pipes.
//!
//! `subduction_overlay` decides, once per display per refresh, which layers
//! of a frame are scanned out directly by hardware overlay pipes and which
//! are composed by the GPU into the framebuffer target. It is `no_std`
//! compatible (with `alloc`) and performs only CPU-side bookkeeping: the
//! caller programs the pipes from the returned plan.
//!
//! # Architecture
//!
//! ```text
//!   layer list ──► classify() ──► FrameStats
//!                                     │
//!                                     ▼
//!   LayerCache ──► Composer::prepare() ◄──► HwResources (shared pipes,
//!       ▲                │                    rotator sessions)
//!       │                ▼
//!       │           FrameInfo ──► caller programs pipes
//!       │                              │
//!       └──── Composer::commit() ◄─────┘
//! ```
//!
//! **[`composer`]**: The per-display [`Composer`](composer::Composer):
//! releases the display's pipes, applies the frame-level gates, runs the
//! strategies in priority order and keeps the plan until commit.
//!
//! **[`strategy`]**: Full, cache-based, load-based and video-only offload,
//! each a [`CompositionStrategy`](strategy::CompositionStrategy), plus the
//! shared pipe binding step.
//!
//! **[`plan`]**: [`FrameInfo`](plan::FrameInfo), the partition of a frame
//! into offloaded and framebuffer-composed layers with z slots and pipes.
//!
//! **[`pipe`]** / **[`rotator`]** / **[`resources`]**: The hardware
//! inventory shared by all displays, with display-scoped ownership.
//!
//! **[`cache`]**: What the last committed frame showed and where.
//!
//! **[`idle`]**: The one-shot idle fallback flag set by a timer.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types for
//! composition instrumentation, with a zero-overhead
//! [`Tracer`](trace::Tracer) wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod cache;
pub mod composer;
pub mod config;
pub mod display;
pub mod error;
pub mod idle;
pub mod layer;
pub mod pipe;
pub mod plan;
pub mod resources;
pub mod rotator;
pub mod stats;
pub mod strategy;
pub mod trace;
