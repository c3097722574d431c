//! Page dimensions, single/spread mode and display scale

use log::debug;
use serde::{Deserialize, Serialize};

/// Render height every page is normalised to before scaling
pub const BASE_PAGE_HEIGHT: f32 = 600.0;
/// Viewports narrower than this show one page at a time
pub const SPREAD_BREAKPOINT: f32 = 1024.0;
pub const MIN_SCALE: f32 = 0.2;
pub const MAX_SCALE: f32 = 1.2;
/// Horizontal space kept clear around the book
pub const HORIZONTAL_PADDING: f32 = 40.0;

/// Host chrome surrounding the book, which decides the vertical padding
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Chrome {
    /// Full header and toolbar
    #[default]
    Toolbar,
    /// Minimal banner shown on shared links
    ShareBanner,
}

impl Chrome {
    pub fn vertical_padding(&self) -> f32 {
        match self {
            Chrome::Toolbar => 320.0,
            Chrome::ShareBanner => 120.0,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Intrinsic size of a document page, in points
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

impl PageSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Width over height, if the size is usable
    pub fn aspect(&self) -> Option<f32> {
        let valid = |v: f32| v.is_finite() && v > 0.0;
        (valid(self.width) && valid(self.height)).then(|| self.width / self.height)
    }
}

/// Unscaled page size handed to the renderer
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RenderDimensions {
    pub width: f32,
    pub height: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpreadMode {
    Single,
    #[default]
    Spread,
}

impl SpreadMode {
    pub fn for_viewport(viewport: Viewport) -> Self {
        if viewport.width < SPREAD_BREAKPOINT {
            SpreadMode::Single
        } else {
            SpreadMode::Spread
        }
    }

    /// Pages visible side by side
    pub fn pages(&self) -> usize {
        match self {
            SpreadMode::Single => 1,
            SpreadMode::Spread => 2,
        }
    }
}

/// Resolved placement of the book in a viewport
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Layout {
    pub dimensions: RenderDimensions,
    pub mode: SpreadMode,
    pub scale: f32,
}

impl Layout {
    /// On-screen width of a single page
    pub fn page_width(&self) -> f32 {
        self.dimensions.width * self.scale
    }

    pub fn page_height(&self) -> f32 {
        self.dimensions.height * self.scale
    }

    /// On-screen size of everything visible at once
    pub fn footprint(&self) -> (f32, f32) {
        (
            self.page_width() * self.mode.pages() as f32,
            self.page_height(),
        )
    }
}

/// Page size at the base height, keeping the first page's aspect ratio
pub fn base_dimensions(first_page: PageSize) -> Option<RenderDimensions> {
    let aspect = first_page.aspect()?;
    Some(RenderDimensions {
        width: (BASE_PAGE_HEIGHT * aspect).floor(),
        height: BASE_PAGE_HEIGHT,
    })
}

pub fn resolve(dimensions: RenderDimensions, viewport: Viewport, chrome: Chrome) -> Layout {
    let mode = SpreadMode::for_viewport(viewport);
    let footprint_width = dimensions.width * mode.pages() as f32;

    let fit_width = (viewport.width - HORIZONTAL_PADDING) / footprint_width;
    let fit_height = (viewport.height - chrome.vertical_padding()) / dimensions.height;
    let scale = fit_width.min(fit_height);
    let scale = if scale.is_nan() {
        MIN_SCALE
    } else {
        scale.clamp(MIN_SCALE, MAX_SCALE)
    };

    Layout {
        dimensions,
        mode,
        scale,
    }
}

/// Tracks dimensions across document loads and viewport changes
#[derive(Clone, Debug, Default)]
pub struct LayoutResolver {
    chrome: Chrome,
    viewport: Option<Viewport>,
    dimensions: Option<RenderDimensions>,
    layout: Option<Layout>,
}

impl LayoutResolver {
    pub fn new(chrome: Chrome) -> Self {
        Self {
            chrome,
            ..Self::default()
        }
    }

    pub fn chrome(&self) -> Chrome {
        self.chrome
    }

    pub fn set_chrome(&mut self, chrome: Chrome) {
        self.chrome = chrome;
        self.recompute();
    }

    pub fn layout(&self) -> Option<Layout> {
        self.layout
    }

    pub fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }

    /// Rendered page width, 0 until both page and viewport are known
    pub fn page_width(&self) -> f32 {
        self.layout.map_or(0.0, |l| l.page_width())
    }

    /// A new document was selected; its pages have not been measured yet
    pub fn document_changed(&mut self) {
        self.dimensions = None;
        self.layout = None;
    }

    pub fn set_first_page(&mut self, size: PageSize) -> Option<Layout> {
        self.dimensions = base_dimensions(size);
        if self.dimensions.is_none() {
            debug!("Unusable first page size {size:?}");
        }
        self.recompute();
        self.layout
    }

    pub fn resize(&mut self, viewport: Viewport) -> Option<Layout> {
        self.viewport = Some(viewport);
        self.recompute();
        self.layout
    }

    fn recompute(&mut self) {
        self.layout = match (self.dimensions, self.viewport) {
            (Some(dimensions), Some(viewport)) => Some(resolve(dimensions, viewport, self.chrome)),
            _ => None,
        };
    }
}
