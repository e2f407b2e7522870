//! Capture effect taxonomy and the pluggable application strategy.
//!
//! The effect set is fixed so callers can validate names up front; the actual
//! image transforms are installed per-name in an [`EffectRegistry`] and
//! default to identity.

use std::collections::HashMap;
use std::fmt;

use image::RgbImage;

/// Effect applied to a capture during post-processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ImageEffect {
    #[default]
    None,
    Blur,
    Contour,
    Detail,
    EdgeEnhance,
    EdgeEnhanceMore,
    Emboss,
    FindEdges,
    Smooth,
    SmoothMore,
    Sharpen,
}

impl ImageEffect {
    /// Every supported effect, in declaration order.
    pub const ALL: [ImageEffect; 11] = [
        ImageEffect::None,
        ImageEffect::Blur,
        ImageEffect::Contour,
        ImageEffect::Detail,
        ImageEffect::EdgeEnhance,
        ImageEffect::EdgeEnhanceMore,
        ImageEffect::Emboss,
        ImageEffect::FindEdges,
        ImageEffect::Smooth,
        ImageEffect::SmoothMore,
        ImageEffect::Sharpen,
    ];

    /// Parse an effect name from string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "none" => Some(Self::None),
            "blur" => Some(Self::Blur),
            "contour" => Some(Self::Contour),
            "detail" => Some(Self::Detail),
            "edge_enhance" => Some(Self::EdgeEnhance),
            "edge_enhance_more" => Some(Self::EdgeEnhanceMore),
            "emboss" => Some(Self::Emboss),
            "find_edges" => Some(Self::FindEdges),
            "smooth" => Some(Self::Smooth),
            "smooth_more" => Some(Self::SmoothMore),
            "sharpen" => Some(Self::Sharpen),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Blur => "blur",
            Self::Contour => "contour",
            Self::Detail => "detail",
            Self::EdgeEnhance => "edge_enhance",
            Self::EdgeEnhanceMore => "edge_enhance_more",
            Self::Emboss => "emboss",
            Self::FindEdges => "find_edges",
            Self::Smooth => "smooth",
            Self::SmoothMore => "smooth_more",
            Self::Sharpen => "sharpen",
        }
    }
}

impl fmt::Display for ImageEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A per-effect image transform.
pub type EffectFn = Box<dyn Fn(RgbImage) -> RgbImage + Send + Sync>;

/// Maps effect names to their implementations.
///
/// Effects without a registered implementation pass the image through
/// unchanged, so the name set stays stable while real filters can be filled
/// in later without breaking callers.
#[derive(Default)]
pub struct EffectRegistry {
    strategies: HashMap<ImageEffect, EffectFn>,
}

impl EffectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install (or replace) the implementation for one effect.
    pub fn register<F>(&mut self, effect: ImageEffect, strategy: F)
    where
        F: Fn(RgbImage) -> RgbImage + Send + Sync + 'static,
    {
        self.strategies.insert(effect, Box::new(strategy));
    }

    /// True if `effect` has a real implementation installed.
    pub fn is_registered(&self, effect: ImageEffect) -> bool {
        self.strategies.contains_key(&effect)
    }

    /// Apply `effect` to `image`, identity if nothing is registered.
    pub fn apply(&self, effect: ImageEffect, image: RgbImage) -> RgbImage {
        match self.strategies.get(&effect) {
            Some(strategy) => strategy(image),
            None => image,
        }
    }
}

impl fmt::Debug for EffectRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut registered: Vec<&str> = self.strategies.keys().map(|e| e.as_str()).collect();
        registered.sort_unstable();
        f.debug_struct("EffectRegistry")
            .field("registered", &registered)
            .finish()
    }
}
