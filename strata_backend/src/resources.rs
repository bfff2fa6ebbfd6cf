pub mod gfx_descriptor_builder;
pub mod mip_slice_matrix;
pub mod texture_array;
pub mod texture_array_codec;
pub mod texture_base;

use std::sync::{
    mpsc::{Receiver, Sender},
    Arc,
};

pub use gfx_descriptor_builder::GfxDescriptorBuilder;
pub use mip_slice_matrix::MipSliceMatrix;
pub use texture_array::{TextureArrayAsset, TextureArrayConfig, TextureArrayCreateInfo, TextureArrayEvent};
pub use texture_array_codec::{CodecVersion, DeferredTextureArray, TextureArrayCodec, TextureArrayRecord};
pub use texture_base::BaseTextureState;

use strata_shared::AsDebugInfo;

/// Trait that provides access to the `Sender` that is used to send [`ResourceEvent`]s to the resource thread
pub trait ResourceReceiver {
    fn sender(&self) -> &Sender<ResourceEvent>;
}

/// Trait that is implemented by the renderer to provide a [`ResourceReceiver`] implementation.
pub trait IntoResourceReceiver {
    type ResourceReceiver: ResourceReceiver;
    fn into_resource_receiver(&self) -> &Self::ResourceReceiver;
}

/// Data on the GPU that doesn't change frequently and is referenced by the instances in the scene
pub trait Resource: AsDebugInfo {}

/// Event that is sent to the resource thread to update the resources
#[derive(Debug)]
pub enum ResourceEvent {
    TextureArray(Vec<TextureArrayEvent>),
}

/// A [`ResourceReceiver`] that can be used for testing
pub struct MockResourceReceiver {
    pub sender: Sender<ResourceEvent>,
    pub receiver: Receiver<ResourceEvent>,
}

impl ResourceReceiver for MockResourceReceiver {
    fn sender(&self) -> &Sender<ResourceEvent> {
        &self.sender
    }
}

/// A mock that acts as the renderer in the context of resources.
pub struct MockRenderer(Arc<MockResourceReceiver>);

impl MockRenderer {
    pub fn new() -> Arc<Self> {
        let (sender, receiver) = std::sync::mpsc::channel();
        Arc::new(Self(Arc::new(MockResourceReceiver { sender, receiver })))
    }

    pub fn sender(&self) -> &Sender<ResourceEvent> {
        self.0.sender()
    }

    pub fn receiver(&self) -> &Receiver<ResourceEvent> {
        &self.0.receiver
    }
}

impl IntoResourceReceiver for MockRenderer {
    type ResourceReceiver = MockResourceReceiver;
    fn into_resource_receiver(&self) -> &Self::ResourceReceiver {
        &self.0
    }
}

#[cfg(test)]
pub mod tests {
    use std::sync::Arc;

    use strata_content::{ImageAsset, PixelFormat};
    use strata_test::spectral::{assert_that, asserting, prelude::OptionAssertions};

    use crate::{texture_array::TextureArrayEvent, MockRenderer, ResourceEvent};

    /// Creates an image with the given size and no embedded mipmap chain
    pub fn new_dummy_image(key: &str, width: u32, height: u32) -> Arc<ImageAsset> {
        ImageAsset::builder(key)
            .with_size(width, height)
            .with_format(PixelFormat::RGBA8888)
            .with_data(vec![0; (width * height * 4) as usize])
            .build()
            .unwrap()
    }

    /// Creates an image of the given size that carries a chain with `level_count` levels
    pub fn new_dummy_chain(key: &str, size: u32, level_count: u32) -> Arc<ImageAsset> {
        let mipmap_level_data_size = (0..level_count)
            .map(|level| ((size >> level).max(1) as usize).pow(2))
            .collect::<Vec<_>>();
        let data = vec![0; mipmap_level_data_size.iter().sum()];
        ImageAsset::builder(key)
            .with_size(size, size)
            .with_format(PixelFormat::A8)
            .with_data(data)
            .with_mipmap_level_data_size(mipmap_level_data_size)
            .build()
            .unwrap()
    }

    /// Receives the next batch of [`TextureArrayEvent`]s
    pub fn receive_texture_array_events(renderer: &MockRenderer) -> Vec<TextureArrayEvent> {
        const TIMEOUT: std::time::Duration = std::time::Duration::from_millis(50);
        let ResourceEvent::TextureArray(texture_array_events) = renderer.receiver().recv_timeout(TIMEOUT).unwrap();
        texture_array_events
    }

    #[macro_export]
    macro_rules! match_one_texture_array_event {
        ($renderer:expr, $p:pat, $($b:tt)*) => {{
            use strata_test::spectral::prelude::*;
            let texture_array_events = $crate::resources::tests::receive_texture_array_events(&$renderer);
            asserting("event count").that(&texture_array_events).has_length(1);
            let $p = &texture_array_events[0] else {
                panic!("unexpected event")
            };
            $($b)*
        }};
    }

    pub fn assert_events_empty(renderer: &MockRenderer) {
        asserting("events empty")
            .that(&renderer.receiver().try_iter().next().is_none())
            .is_equal_to(true);
        assert_that!(renderer.receiver().try_iter().next()).is_none();
    }
}
