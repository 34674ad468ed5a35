/// What the page's tooltip should show. Applied to the DOM by the web entry.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Tooltip {
    pub visible: bool,
    /// Pixels from the canvas' top-left corner.
    pub screen_x: f32,
    pub screen_y: f32,
    pub title: String,
    pub subtitle: Option<String>,
    pub body: String,
}

impl Tooltip {
    pub fn hidden() -> Self {
        Tooltip::default()
    }
}
