use strata_content::PixelFormat;
use strata_shared::{log::trace, thiserror};

use crate::gfx::{Filter, Format, TextureFlags, TextureInfo, TextureUsage, TextureViewInfo, WrapMode};

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum Error {
    #[error("The base state '{base}' is invalid: {reason}")]
    InvalidBase { base: String, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Shape and sampler state that every texture asset carries.
#[derive(Debug, Clone, PartialEq)]
pub struct BaseTextureState {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) format: PixelFormat,
    pub(crate) mipmap_level: u32,
    pub(crate) base_level: u32,
    pub(crate) max_level: u32,
    min_filter: Filter,
    mag_filter: Filter,
    mip_filter: Filter,
    wrap_s: WrapMode,
    wrap_t: WrapMode,
    wrap_r: WrapMode,
    anisotropy: u32,
}

impl Default for BaseTextureState {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            format: PixelFormat::default(),
            mipmap_level: 1,
            base_level: 0,
            max_level: 1000,
            min_filter: Filter::Linear,
            mag_filter: Filter::Linear,
            mip_filter: Filter::None,
            wrap_s: WrapMode::Repeat,
            wrap_t: WrapMode::Repeat,
            wrap_r: WrapMode::Repeat,
            anisotropy: 0,
        }
    }
}

impl BaseTextureState {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Returns the number of mipmap levels
    pub fn mipmap_level(&self) -> u32 {
        self.mipmap_level
    }

    pub fn base_level(&self) -> u32 {
        self.base_level
    }

    pub fn max_level(&self) -> u32 {
        self.max_level
    }

    pub fn filters(&self) -> (Filter, Filter) {
        (self.min_filter, self.mag_filter)
    }

    pub fn mip_filter(&self) -> Filter {
        self.mip_filter
    }

    /// Returns the wrap modes along s, t and r
    pub fn wrap_mode(&self) -> (WrapMode, WrapMode, WrapMode) {
        (self.wrap_s, self.wrap_t, self.wrap_r)
    }

    pub fn anisotropy(&self) -> u32 {
        self.anisotropy
    }

    pub fn set_filters(&mut self, min_filter: Filter, mag_filter: Filter) {
        self.min_filter = min_filter;
        self.mag_filter = mag_filter;
    }

    pub fn set_mip_filter(&mut self, mip_filter: Filter) {
        self.mip_filter = mip_filter;
    }

    pub fn set_wrap_mode(&mut self, wrap_s: WrapMode, wrap_t: WrapMode, wrap_r: WrapMode) {
        self.wrap_s = wrap_s;
        self.wrap_t = wrap_t;
        self.wrap_r = wrap_r;
    }

    pub fn set_anisotropy(&mut self, anisotropy: u32) {
        self.anisotropy = anisotropy;
    }

    /// Returns the descriptor that the texture would get without knowing that it's an array.
    pub fn presumed_texture_info(&self, usage: TextureUsage) -> TextureInfo {
        let mut flags = TextureFlags::empty();
        if self.mip_filter != Filter::None && self.mipmap_level <= 1 {
            flags |= TextureFlags::GEN_MIPMAP;
        }
        TextureInfo {
            usage,
            format: Format::from(self.format),
            width: self.width,
            height: self.height,
            flags,
            level_count: self.mipmap_level.max(1),
            ..Default::default()
        }
    }

    /// Returns the view descriptor that covers the levels from `base_level` to `max_level`.
    pub fn presumed_texture_view_info(&self) -> TextureViewInfo {
        let top_level = self.max_level.min(self.mipmap_level.saturating_sub(1));
        TextureViewInfo {
            format: Format::from(self.format),
            base_level: self.base_level,
            level_count: top_level.saturating_sub(self.base_level) + 1,
            ..Default::default()
        }
    }

    /// Persists the sampler state as `"min,mag,wrap_s,wrap_t,mip,anisotropy,wrap_r"`.
    pub fn serialize(&self) -> String {
        format!(
            "{},{},{},{},{},{},{}",
            self.min_filter as u32,
            self.mag_filter as u32,
            self.wrap_s as u32,
            self.wrap_t as u32,
            self.mip_filter as u32,
            self.anisotropy,
            self.wrap_r as u32
        )
    }

    /// Restores the sampler state from the output of [`BaseTextureState::serialize`].
    ///
    /// An empty string keeps the current state. Older records may only carry the filters
    /// and wrap modes (4 fields) or omit `wrap_r` (6 fields).
    pub fn deserialize(&mut self, base: &str) -> Result<()> {
        if base.is_empty() {
            return Ok(());
        }
        let invalid = |reason: String| Error::InvalidBase {
            base: base.to_owned(),
            reason,
        };
        let fields = base
            .split(',')
            .map(|field| field.trim().parse::<u32>().map_err(|err| invalid(format!("'{field}': {err}"))))
            .collect::<Result<Vec<_>>>()?;
        if !matches!(fields.len(), 4 | 6 | 7) {
            return Err(invalid(format!("expected 4, 6 or 7 fields but found {}", fields.len())));
        }
        let filter = |value: u32| Filter::try_from(value).map_err(|value| invalid(format!("unknown filter {value}")));
        let wrap_mode = |value: u32| WrapMode::try_from(value).map_err(|value| invalid(format!("unknown wrap mode {value}")));

        let mut state = self.clone();
        state.set_filters(filter(fields[0])?, filter(fields[1])?);
        state.wrap_s = wrap_mode(fields[2])?;
        state.wrap_t = wrap_mode(fields[3])?;
        if fields.len() >= 6 {
            state.mip_filter = filter(fields[4])?;
            state.anisotropy = fields[5];
        }
        if let Some(&wrap_r) = fields.get(6) {
            state.wrap_r = wrap_mode(wrap_r)?;
        }
        trace!("Restored sampler state from '{base}'");
        *self = state;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let state = BaseTextureState::default();
        assert_eq!((state.base_level(), state.max_level()), (0, 1000));
        assert_eq!(state.format(), PixelFormat::RGBA8888);
        assert_eq!(state.serialize(), "2,2,0,0,0,0,0");
    }

    #[test]
    fn sampler_round_trip() {
        let mut state = BaseTextureState::default();
        state.set_filters(Filter::Point, Filter::Anisotropic);
        state.set_mip_filter(Filter::Linear);
        state.set_wrap_mode(WrapMode::ClampToEdge, WrapMode::MirroredRepeat, WrapMode::ClampToBorder);
        state.set_anisotropy(8);
        let base = state.serialize();
        assert_eq!(base, "1,3,1,2,2,8,3");

        let mut restored = BaseTextureState::default();
        restored.deserialize(&base).unwrap();
        assert_eq!(restored, state);
    }

    #[test]
    fn short_blobs() {
        let mut state = BaseTextureState::default();
        state.deserialize("1,1,2,2").unwrap();
        assert_eq!(state.filters(), (Filter::Point, Filter::Point));
        assert_eq!(state.wrap_mode(), (WrapMode::MirroredRepeat, WrapMode::MirroredRepeat, WrapMode::Repeat));
        assert_eq!(state.mip_filter(), Filter::None);

        state.deserialize("1,1,2,2,1,4").unwrap();
        assert_eq!(state.mip_filter(), Filter::Point);
        assert_eq!(state.anisotropy(), 4);
        assert_eq!(state.wrap_mode().2, WrapMode::Repeat);

        let before = state.clone();
        state.deserialize("").unwrap();
        assert_eq!(state, before);
    }

    #[test]
    fn invalid_blobs_leave_state_untouched() {
        let mut state = BaseTextureState::default();
        for base in ["1,2", "1,2,x,0", "1,2,0,0,9,0,0", "1,2,0,0,0,0,0,0"] {
            assert!(matches!(state.deserialize(base), Err(Error::InvalidBase { .. })), "{base}");
        }
        assert_eq!(state, BaseTextureState::default());
    }

    #[test]
    fn presumed_view_covers_level_range() {
        let mut state = BaseTextureState {
            mipmap_level: 5,
            ..Default::default()
        };
        assert_eq!(state.presumed_texture_view_info().level_count, 5);
        state.base_level = 1;
        state.max_level = 3;
        let view = state.presumed_texture_view_info();
        assert_eq!((view.base_level, view.level_count), (1, 3));
        state.base_level = 7;
        assert_eq!(state.presumed_texture_view_info().level_count, 1);
    }

    #[test]
    fn generated_mipmaps_only_without_chain() {
        let mut state = BaseTextureState::default();
        state.set_mip_filter(Filter::Linear);
        let usage = TextureUsage::SAMPLED;
        assert!(state.presumed_texture_info(usage).flags.contains(TextureFlags::GEN_MIPMAP));
        state.mipmap_level = 4;
        let info = state.presumed_texture_info(usage);
        assert!(info.flags.is_empty());
        assert_eq!(info.level_count, 4);
        assert_eq!(info.usage, usage);
    }
}
