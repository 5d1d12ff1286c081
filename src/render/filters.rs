// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Ordered effect chains built from an image layer's filters.
//!
//! Effects are not commutative (grayscale after a hue rotation differs from
//! the reverse), so the chain is always built in one fixed order:
//! brightness, contrast, saturation, hue-rotate, blur, grayscale, sepia,
//! invert.

use crate::models::layer::ImageFilters;
use std::fmt;

/// A single effect with its backend-facing amount.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Effect {
    /// Multiplier, 1.0 = unchanged.
    Brightness(f64),
    /// Multiplier, 1.0 = unchanged.
    Contrast(f64),
    /// Multiplier, 1.0 = unchanged.
    Saturate(f64),
    /// Degrees.
    HueRotate(f64),
    /// Radius in pixels.
    Blur(f64),
    Grayscale,
    Sepia,
    Invert,
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Effect::Brightness(v) => write!(f, "brightness({})", v),
            Effect::Contrast(v) => write!(f, "contrast({})", v),
            Effect::Saturate(v) => write!(f, "saturate({})", v),
            Effect::HueRotate(v) => write!(f, "hue-rotate({}deg)", v),
            Effect::Blur(v) => write!(f, "blur({}px)", v),
            Effect::Grayscale => write!(f, "grayscale(1)"),
            Effect::Sepia => write!(f, "sepia(1)"),
            Effect::Invert => write!(f, "invert(1)"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EffectChain {
    effects: Vec<Effect>,
}

impl EffectChain {
    /// Build the chain from every filter that is present.
    ///
    /// `sharpen` is not part of the chain; it travels on the image drawable.
    pub fn from_filters(filters: &ImageFilters) -> Self {
        let mut effects = Vec::new();
        if let Some(delta) = filters.brightness {
            effects.push(Effect::Brightness(1.0 + delta / 100.0));
        }
        if let Some(delta) = filters.contrast {
            effects.push(Effect::Contrast(1.0 + delta / 100.0));
        }
        if let Some(delta) = filters.saturation {
            effects.push(Effect::Saturate(1.0 + delta / 100.0));
        }
        if let Some(degrees) = filters.hue {
            effects.push(Effect::HueRotate(degrees));
        }
        if let Some(radius) = filters.blur {
            effects.push(Effect::Blur(radius));
        }
        if filters.grayscale {
            effects.push(Effect::Grayscale);
        }
        if filters.sepia {
            effects.push(Effect::Sepia);
        }
        if filters.invert {
            effects.push(Effect::Invert);
        }
        Self { effects }
    }

    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Space separated filter string, e.g. `brightness(1.2) grayscale(1)`.
    pub fn to_filter_string(&self) -> String {
        self.effects
            .iter()
            .map(Effect::to_string)
            .collect::<Vec<_>>()
            .join(" ")
    }
}
