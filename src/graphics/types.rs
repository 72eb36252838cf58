//! Shared geometry and typed handle ids.

/// Integer rectangle, DxLib's `PLRect`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// Build from Win32-style edges.
    pub const fn from_edges(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            x: left,
            y: top,
            w: right - left,
            h: bottom - top,
        }
    }
}

macro_rules! handle_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub i32);

        impl $name {
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            pub const fn id(self) -> i32 {
                self.0
            }

            /// `None` for the `-1`-style "no handle" sentinels.
            pub const fn from_raw(id: i32) -> Option<Self> {
                if id >= 0 {
                    Some(Self(id))
                } else {
                    None
                }
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

handle_id!(
    /// Texture reference slot in the handle table.
    TextureId
);
handle_id!(
    /// User-visible graph handle.
    GraphId
);
handle_id!(
    /// CPU-side pixel surface.
    SurfaceId
);
handle_id!(
    /// Pooled framebuffer slot.
    FramebufferId
);

/// Collapse an optional id to the C-style `-1` sentinel.
pub fn raw_or_neg<T: Into<i32>>(id: Option<T>) -> i32 {
    id.map_or(-1, Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_from_edges() {
        assert_eq!(Rect::from_edges(10, 20, 30, 60), Rect::new(10, 20, 20, 40));
    }

    #[test]
    fn test_id_sentinels() {
        assert_eq!(GraphId::from_raw(-1), None);
        assert_eq!(GraphId::from_raw(3), Some(GraphId::new(3)));
        assert_eq!(raw_or_neg::<TextureId>(None), -1);
        assert_eq!(raw_or_neg(Some(TextureId::new(9))), 9);
    }
}
