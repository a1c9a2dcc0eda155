//! Channel model: channels, channel sets and layered layouts.
//!
//! A [`ChannelLayout`] groups channels into named layers such as
//! `rgba` or `depth`. The position of a channel inside its layer is its
//! *color index*: red is 0, green 1, blue 2 and alpha 3. Color kernels
//! operate on *color triples*, the first three channels of any layer
//! that has at least three channels.
//!
//! ```text
//! layer "rgba"   : rgba.red(0) rgba.green(1) rgba.blue(2) rgba.alpha(3)
//! layer "depth"  : depth.Z(0)
//! layer "spec"   : spec.red(0) spec.green(1) spec.blue(2)
//! ```
//!
//! # Example
//!
//! ```rust
//! use pixfx_core::{ChannelLayout, ChannelSet};
//!
//! let layout = ChannelLayout::rgba().with_layer("depth", &["Z"]).unwrap();
//! let green = layout.find("rgba.green").unwrap();
//!
//! // Asking for green alone pulls in its red and blue brothers.
//! let wanted = layout.add_brothers(ChannelSet::from(green));
//! assert_eq!(wanted.len(), 3);
//! ```

use crate::error::{Error, Result};
use std::fmt;
use std::ops::{BitAnd, BitOr, Sub};

/// Maximum number of channels a layout may hold.
pub const MAX_CHANNELS: usize = 64;

/// Index of a channel inside a [`ChannelLayout`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Channel(u8);

impl Channel {
    /// First channel of the default `rgba` layout.
    pub const RED: Self = Self(0);
    /// Second channel of the default `rgba` layout.
    pub const GREEN: Self = Self(1);
    /// Third channel of the default `rgba` layout.
    pub const BLUE: Self = Self(2);
    /// Fourth channel of the default `rgba` layout.
    pub const ALPHA: Self = Self(3);

    /// Creates a channel from its layout index.
    ///
    /// Returns `None` if `index >= MAX_CHANNELS`.
    #[inline]
    pub const fn new(index: usize) -> Option<Self> {
        if index < MAX_CHANNELS {
            Some(Self(index as u8))
        } else {
            None
        }
    }

    /// Layout index of this channel.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// A set of channels stored as a 64-bit mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ChannelSet(u64);

impl ChannelSet {
    /// The empty set.
    pub const EMPTY: Self = Self(0);

    /// Red, green and blue of the default layout.
    pub const RGB: Self = Self(0b0111);

    /// Red, green, blue and alpha of the default layout.
    pub const RGBA: Self = Self(0b1111);

    /// Set containing the first `count` channels.
    #[inline]
    pub const fn first(count: usize) -> Self {
        if count >= MAX_CHANNELS {
            Self(u64::MAX)
        } else {
            Self((1u64 << count) - 1)
        }
    }

    /// Returns `true` if `ch` is in the set.
    #[inline]
    pub const fn contains(self, ch: Channel) -> bool {
        self.0 & (1u64 << ch.0) != 0
    }

    /// Adds `ch` to the set.
    #[inline]
    pub fn insert(&mut self, ch: Channel) {
        self.0 |= 1u64 << ch.0;
    }

    /// Removes `ch` from the set.
    #[inline]
    pub fn remove(&mut self, ch: Channel) {
        self.0 &= !(1u64 << ch.0);
    }

    /// Returns a copy with `ch` added.
    #[inline]
    pub const fn with(self, ch: Channel) -> Self {
        Self(self.0 | (1u64 << ch.0))
    }

    /// Number of channels in the set.
    #[inline]
    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Returns `true` if the set has no channels.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterates the channels in ascending index order.
    pub fn iter(self) -> impl Iterator<Item = Channel> {
        let mut bits = self.0;
        std::iter::from_fn(move || {
            if bits == 0 {
                return None;
            }
            let idx = bits.trailing_zeros();
            bits &= bits - 1;
            Some(Channel(idx as u8))
        })
    }
}

impl From<Channel> for ChannelSet {
    fn from(ch: Channel) -> Self {
        Self::EMPTY.with(ch)
    }
}

impl FromIterator<Channel> for ChannelSet {
    fn from_iter<I: IntoIterator<Item = Channel>>(iter: I) -> Self {
        iter.into_iter().fold(Self::EMPTY, Self::with)
    }
}

impl BitOr for ChannelSet {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitAnd for ChannelSet {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl Sub for ChannelSet {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 & !rhs.0)
    }
}

/// A named group of consecutive channels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layer {
    name: String,
    first: usize,
    channels: Vec<String>,
}

impl Layer {
    /// Layer name, e.g. `rgba`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of channels in the layer.
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Returns `true` if the layer has no channels. Never the case for
    /// layers created through [`ChannelLayout::with_layer`].
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Channels of this layer in order.
    pub fn channels(&self) -> impl Iterator<Item = Channel> + '_ {
        (self.first..self.first + self.channels.len()).map(|i| Channel(i as u8))
    }

    /// Returns `true` if the layer carries a color triple.
    pub fn has_triple(&self) -> bool {
        self.channels.len() >= 3
    }
}

/// Ordered description of every channel an image carries.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChannelLayout {
    layers: Vec<Layer>,
    // layer index per channel
    owner: Vec<usize>,
}

impl ChannelLayout {
    /// Creates an empty layout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Layout with a single `rgb` layer.
    pub fn rgb() -> Self {
        Self::single("rgb", &["red", "green", "blue"])
    }

    /// Layout with a single `rgba` layer.
    pub fn rgba() -> Self {
        Self::single("rgba", &["red", "green", "blue", "alpha"])
    }

    fn single(name: &str, channels: &[&str]) -> Self {
        Self {
            layers: vec![Layer {
                name: name.to_string(),
                first: 0,
                channels: channels.iter().map(|c| c.to_string()).collect(),
            }],
            owner: vec![0; channels.len()],
        }
    }

    /// Appends a layer and returns the extended layout.
    ///
    /// Fails if the name is already used, the layer is empty or the
    /// layout would exceed [`MAX_CHANNELS`].
    pub fn with_layer(mut self, name: &str, channels: &[&str]) -> Result<Self> {
        if channels.is_empty() {
            return Err(Error::invalid_layer(name, "layer has no channels"));
        }
        if self.layers.iter().any(|l| l.name == name) {
            return Err(Error::invalid_layer(name, "duplicate layer name"));
        }
        let count = self.owner.len() + channels.len();
        if count > MAX_CHANNELS {
            return Err(Error::TooManyChannels {
                count,
                max: MAX_CHANNELS,
            });
        }

        let layer_idx = self.layers.len();
        self.layers.push(Layer {
            name: name.to_string(),
            first: self.owner.len(),
            channels: channels.iter().map(|c| c.to_string()).collect(),
        });
        self.owner.extend(std::iter::repeat_n(layer_idx, channels.len()));
        Ok(self)
    }

    /// Total number of channels.
    pub fn len(&self) -> usize {
        self.owner.len()
    }

    /// Returns `true` if the layout has no channels.
    pub fn is_empty(&self) -> bool {
        self.owner.is_empty()
    }

    /// All layers in order.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Set of every channel in the layout.
    pub fn all(&self) -> ChannelSet {
        ChannelSet::first(self.len())
    }

    /// Checks that `ch` belongs to this layout.
    pub fn check(&self, ch: Channel) -> Result<()> {
        if ch.index() < self.len() {
            Ok(())
        } else {
            Err(Error::channel_out_of_range(ch.index(), self.len()))
        }
    }

    /// Looks up a channel by its full `layer.channel` name.
    pub fn find(&self, full_name: &str) -> Option<Channel> {
        let (layer, chan) = full_name.split_once('.')?;
        let layer = self.layers.iter().find(|l| l.name == layer)?;
        let pos = layer.channels.iter().position(|c| c == chan)?;
        Channel::new(layer.first + pos)
    }

    /// Full `layer.channel` name of `ch`.
    pub fn name(&self, ch: Channel) -> Option<String> {
        let layer = self.layer_of(ch)?;
        let chan = &layer.channels[ch.index() - layer.first];
        Some(format!("{}.{}", layer.name, chan))
    }

    /// Layer that owns `ch`.
    pub fn layer_of(&self, ch: Channel) -> Option<&Layer> {
        self.owner.get(ch.index()).map(|&l| &self.layers[l])
    }

    /// Position of `ch` inside its layer. Channels outside the layout
    /// report `usize::MAX`, which no kernel treats as a color index.
    pub fn color_index(&self, ch: Channel) -> usize {
        match self.layer_of(ch) {
            Some(layer) => ch.index() - layer.first,
            None => usize::MAX,
        }
    }

    /// Returns `true` if `ch` is the red, green or blue member of a triple.
    pub fn is_triple_member(&self, ch: Channel) -> bool {
        self.layer_of(ch)
            .is_some_and(|l| l.has_triple() && ch.index() - l.first < 3)
    }

    /// The `i`-th channel of the layer that owns `ch`.
    pub fn brother(&self, ch: Channel, i: usize) -> Option<Channel> {
        let layer = self.layer_of(ch)?;
        if i < layer.len() {
            Channel::new(layer.first + i)
        } else {
            None
        }
    }

    /// Extends `set` with the full triple of every triple member in it.
    pub fn add_brothers(&self, set: ChannelSet) -> ChannelSet {
        self.triples(set)
            .into_iter()
            .flatten()
            .fold(set, ChannelSet::with)
    }

    /// Distinct color triples touched by `set`, in layer order.
    pub fn triples(&self, set: ChannelSet) -> Vec<[Channel; 3]> {
        self.layers
            .iter()
            .filter(|l| l.has_triple())
            .filter(|l| l.channels().take(3).any(|c| set.contains(c)))
            .map(|l| {
                let base = l.first as u8;
                [Channel(base), Channel(base + 1), Channel(base + 2)]
            })
            .collect()
    }
}

impl fmt::Display for ChannelLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self
            .layers
            .iter()
            .map(|l| format!("{}({})", l.name, l.channels.join(",")))
            .collect();
        f.write_str(&names.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> ChannelLayout {
        ChannelLayout::rgba()
            .with_layer("depth", &["Z"])
            .unwrap()
            .with_layer("spec", &["red", "green", "blue"])
            .unwrap()
    }

    #[test]
    fn set_operations() {
        let mut set = ChannelSet::EMPTY;
        set.insert(Channel::GREEN);
        set.insert(Channel::ALPHA);
        assert_eq!(set.len(), 2);
        assert!(set.contains(Channel::GREEN));
        assert!(!set.contains(Channel::RED));

        set.remove(Channel::GREEN);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![Channel::ALPHA]);

        assert_eq!(ChannelSet::RGBA - ChannelSet::RGB, ChannelSet::from(Channel::ALPHA));
        assert_eq!(ChannelSet::RGB & ChannelSet::RGBA, ChannelSet::RGB);
        assert_eq!(ChannelSet::first(64).len(), 64);
    }

    #[test]
    fn color_indices() {
        let layout = layout();
        assert_eq!(layout.len(), 8);
        assert_eq!(layout.color_index(Channel::ALPHA), 3);

        let z = layout.find("depth.Z").unwrap();
        assert_eq!(z.index(), 4);
        assert_eq!(layout.color_index(z), 0);
        assert!(!layout.is_triple_member(z));

        let spec_blue = layout.find("spec.blue").unwrap();
        assert_eq!(layout.color_index(spec_blue), 2);
        assert!(layout.is_triple_member(spec_blue));
        assert!(!layout.is_triple_member(Channel::ALPHA));
        assert_eq!(layout.name(spec_blue).as_deref(), Some("spec.blue"));
    }

    #[test]
    fn brothers_and_triples() {
        let layout = layout();
        let spec_green = layout.find("spec.green").unwrap();

        let set = ChannelSet::from(spec_green).with(Channel::ALPHA);
        let expanded = layout.add_brothers(set);
        assert_eq!(expanded.len(), 4);
        assert!(expanded.contains(layout.find("spec.red").unwrap()));
        assert!(!expanded.contains(Channel::RED));

        let triples = layout.triples(layout.all());
        assert_eq!(triples.len(), 2);
        assert_eq!(triples[0], [Channel::RED, Channel::GREEN, Channel::BLUE]);
        assert_eq!(layout.brother(spec_green, 0), layout.find("spec.red"));
        assert_eq!(layout.brother(spec_green, 3), None);
    }

    #[test]
    fn rejects_bad_layers() {
        assert!(ChannelLayout::rgba().with_layer("rgba", &["x"]).is_err());
        assert!(ChannelLayout::rgba().with_layer("empty", &[]).is_err());

        let names: Vec<String> = (0..61).map(|i| format!("c{i}")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        assert!(ChannelLayout::rgba().with_layer("big", &refs).is_err());
    }

    #[test]
    fn check_bounds() {
        let layout = ChannelLayout::rgb();
        assert!(layout.check(Channel::BLUE).is_ok());
        assert!(layout.check(Channel::ALPHA).is_err());
        assert_eq!(layout.color_index(Channel::ALPHA), usize::MAX);
    }
}
