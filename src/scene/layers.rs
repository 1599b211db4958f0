//! Named drawing layers and the retained shapes they hold.

use bevy::prelude::*;

use crate::model::StarType;
use crate::theme::{Fill, IconId, Stroke};

/// Fixed paint order, bottom to top.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum Layer {
    Backdrop,
    Borders,
    Sectors,
    Selection,
    ShipRange,
    Routes,
    TradeLines,
    StarNames,
    FleetIcons,
}

impl Layer {
    pub const COUNT: usize = 9;

    pub const ALL: [Layer; Layer::COUNT] = [
        Layer::Backdrop,
        Layer::Borders,
        Layer::Sectors,
        Layer::Selection,
        Layer::ShipRange,
        Layer::Routes,
        Layer::TradeLines,
        Layer::StarNames,
        Layer::FleetIcons,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn opacity(self) -> f32 {
        match self {
            Layer::Routes => 0.5,
            _ => 1.0,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TextAlign {
    Left,
    Center,
}

/// A retained primitive in world coordinates.
#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    Line {
        from: Vec2,
        to: Vec2,
        stroke: Stroke,
    },
    Polyline {
        points: Vec<Vec2>,
        stroke: Stroke,
    },
    Rect {
        min: Vec2,
        size: Vec2,
        fill: Option<Fill>,
        stroke: Option<Stroke>,
    },
    Star {
        center: Vec2,
        star: StarType,
        radius: f32,
        color: Color,
    },
    Text {
        origin: Vec2,
        width: f32,
        lines: Vec<String>,
        font_size: f32,
        color: Color,
        align: TextAlign,
        background: Option<Color>,
    },
    Icon {
        min: Vec2,
        size: f32,
        icon: IconId,
    },
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SceneLayers {
    layers: [Vec<Shape>; Layer::COUNT],
}

impl SceneLayers {
    pub fn clear(&mut self, layer: Layer) {
        self.layers[layer.index()].clear();
    }

    pub fn clear_all(&mut self) {
        self.layers.iter_mut().for_each(Vec::clear);
    }

    pub fn push(&mut self, layer: Layer, shape: Shape) {
        self.layers[layer.index()].push(shape);
    }

    pub fn shapes(&self, layer: Layer) -> &[Shape] {
        &self.layers[layer.index()]
    }

    /// Layers in paint order.
    pub fn iter(&self) -> impl Iterator<Item = (Layer, &[Shape])> + '_ {
        Layer::ALL
            .iter()
            .map(move |&layer| (layer, self.shapes(layer)))
    }

    pub fn is_empty(&self) -> bool {
        self.layers.iter().all(Vec::is_empty)
    }
}
