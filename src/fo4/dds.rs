//! Rebuilds the DDS header that DX10 archives strip from their textures.

use crate::{cc, fo4::DX10Header};

mod constants {
    use crate::cc;

    pub const MAGIC: u32 = cc::make_four(b"DDS ");
    pub const HEADER_SIZE: u32 = 124;
    pub const PIXEL_FORMAT_SIZE: u32 = 32;

    pub const DDSD_CAPS: u32 = 0x0000_0001;
    pub const DDSD_HEIGHT: u32 = 0x0000_0002;
    pub const DDSD_WIDTH: u32 = 0x0000_0004;
    pub const DDSD_PITCH: u32 = 0x0000_0008;
    pub const DDSD_PIXELFORMAT: u32 = 0x0000_1000;
    pub const DDSD_MIPMAPCOUNT: u32 = 0x0002_0000;
    pub const DDSD_LINEARSIZE: u32 = 0x0008_0000;

    pub const DDSCAPS_COMPLEX: u32 = 0x0000_0008;
    pub const DDSCAPS_TEXTURE: u32 = 0x0000_1000;
    pub const DDSCAPS_MIPMAP: u32 = 0x0040_0000;

    pub const DDSCAPS2_CUBEMAP: u32 = 0x0000_0200;
    pub const DDSCAPS2_CUBEMAP_ALLFACES: u32 = 0x0000_FC00;

    pub const DDPF_ALPHAPIXELS: u32 = 0x0000_0001;
    pub const DDPF_ALPHA: u32 = 0x0000_0002;
    pub const DDPF_FOURCC: u32 = 0x0000_0004;
    pub const DDPF_RGB: u32 = 0x0000_0040;
    pub const DDPF_LUMINANCE: u32 = 0x0002_0000;

    pub const DIMENSION_TEXTURE2D: u32 = 3;
    pub const MISC_TEXTURECUBE: u32 = 0x4;
}

mod dxgi {
    pub const R8G8B8A8_UNORM: u8 = 28;
    pub const R8G8B8A8_UNORM_SRGB: u8 = 29;
    pub const R8G8B8A8_UINT: u8 = 30;
    pub const R8G8B8A8_SINT: u8 = 32;
    pub const R8G8_UNORM: u8 = 49;
    pub const R8G8_UINT: u8 = 50;
    pub const R8G8_SINT: u8 = 52;
    pub const R8_UNORM: u8 = 61;
    pub const R8_UINT: u8 = 62;
    pub const R8_SNORM: u8 = 63;
    pub const R8_SINT: u8 = 64;
    pub const A8_UNORM: u8 = 65;
    pub const BC1_UNORM: u8 = 71;
    pub const BC1_UNORM_SRGB: u8 = 72;
    pub const BC2_UNORM: u8 = 74;
    pub const BC2_UNORM_SRGB: u8 = 75;
    pub const BC3_UNORM: u8 = 77;
    pub const BC3_UNORM_SRGB: u8 = 78;
    pub const BC4_UNORM: u8 = 80;
    pub const BC4_SNORM: u8 = 81;
    pub const BC5_UNORM: u8 = 83;
    pub const BC5_SNORM: u8 = 84;
    pub const B5G6R5_UNORM: u8 = 85;
    pub const B5G5R5A1_UNORM: u8 = 86;
    pub const B8G8R8A8_UNORM: u8 = 87;
    pub const B8G8R8X8_UNORM: u8 = 88;
    pub const B8G8R8A8_UNORM_SRGB: u8 = 91;
    pub const B8G8R8X8_UNORM_SRGB: u8 = 93;
    pub const BC6H_UF16: u8 = 95;
    pub const BC6H_SF16: u8 = 96;
    pub const BC7_UNORM: u8 = 98;
    pub const BC7_UNORM_SRGB: u8 = 99;
}

#[derive(Default)]
struct PixelFormat {
    flags: u32,
    four_cc: u32,
    bit_count: u32,
    masks: [u32; 4],
}

impl PixelFormat {
    fn four_cc(code: &[u8]) -> Self {
        Self {
            flags: constants::DDPF_FOURCC,
            four_cc: cc::make_four(code),
            ..Self::default()
        }
    }

    fn extended() -> Self {
        Self::four_cc(b"DX10")
    }

    fn masked(flags: u32, bit_count: u32, masks: [u32; 4]) -> Self {
        Self {
            flags,
            four_cc: 0,
            bit_count,
            masks,
        }
    }

    fn is_extended(&self) -> bool {
        self.four_cc == cc::make_four(b"DX10")
    }
}

enum Pitch {
    /// The size of the top level mip, for block compressed formats.
    Linear(u32),
    /// The size of one row of the top level mip.
    Row(u32),
    Unknown,
}

fn describe(format: u8, width: u32, height: u32) -> (PixelFormat, Pitch) {
    use constants::{DDPF_ALPHA, DDPF_ALPHAPIXELS, DDPF_LUMINANCE, DDPF_RGB};

    let half_block = Pitch::Linear(width * height / 2);
    let full_block = Pitch::Linear(width * height);
    match format {
        dxgi::BC1_UNORM => (PixelFormat::four_cc(b"DXT1"), half_block),
        dxgi::BC2_UNORM => (PixelFormat::four_cc(b"DXT3"), full_block),
        dxgi::BC3_UNORM => (PixelFormat::four_cc(b"DXT5"), full_block),
        dxgi::BC4_SNORM => (PixelFormat::four_cc(b"BC4S"), half_block),
        dxgi::BC4_UNORM => (PixelFormat::four_cc(b"BC4U"), half_block),
        dxgi::BC5_SNORM => (PixelFormat::four_cc(b"BC5S"), full_block),
        dxgi::BC5_UNORM => (PixelFormat::four_cc(b"BC5U"), full_block),
        dxgi::BC1_UNORM_SRGB => (PixelFormat::extended(), half_block),
        dxgi::BC2_UNORM_SRGB
        | dxgi::BC3_UNORM_SRGB
        | dxgi::BC6H_UF16
        | dxgi::BC6H_SF16
        | dxgi::BC7_UNORM
        | dxgi::BC7_UNORM_SRGB => (PixelFormat::extended(), full_block),
        dxgi::B8G8R8A8_UNORM_SRGB
        | dxgi::B8G8R8X8_UNORM_SRGB
        | dxgi::R8G8B8A8_SINT
        | dxgi::R8G8B8A8_UINT
        | dxgi::R8G8B8A8_UNORM_SRGB => (PixelFormat::extended(), Pitch::Row(width * 4)),
        dxgi::R8G8_SINT | dxgi::R8G8_UINT => (PixelFormat::extended(), Pitch::Row(width * 2)),
        dxgi::R8_SINT | dxgi::R8_SNORM | dxgi::R8_UINT => {
            (PixelFormat::extended(), Pitch::Row(width))
        }
        dxgi::R8G8B8A8_UNORM => (
            PixelFormat::masked(
                DDPF_RGB | DDPF_ALPHAPIXELS,
                32,
                [0x0000_00FF, 0x0000_FF00, 0x00FF_0000, 0xFF00_0000],
            ),
            Pitch::Row(width * 4),
        ),
        dxgi::B8G8R8A8_UNORM => (
            PixelFormat::masked(
                DDPF_RGB | DDPF_ALPHAPIXELS,
                32,
                [0x00FF_0000, 0x0000_FF00, 0x0000_00FF, 0xFF00_0000],
            ),
            Pitch::Row(width * 4),
        ),
        dxgi::B8G8R8X8_UNORM => (
            PixelFormat::masked(DDPF_RGB, 32, [0x00FF_0000, 0x0000_FF00, 0x0000_00FF, 0]),
            Pitch::Row(width * 4),
        ),
        dxgi::B5G6R5_UNORM => (
            PixelFormat::masked(DDPF_RGB, 16, [0x0000_F800, 0x0000_07E0, 0x0000_001F, 0]),
            Pitch::Row(width * 2),
        ),
        dxgi::B5G5R5A1_UNORM => (
            PixelFormat::masked(
                DDPF_RGB | DDPF_ALPHAPIXELS,
                16,
                [0x0000_7C00, 0x0000_03E0, 0x0000_001F, 0x0000_8000],
            ),
            Pitch::Row(width * 2),
        ),
        dxgi::R8G8_UNORM => (
            PixelFormat::masked(
                DDPF_LUMINANCE | DDPF_ALPHAPIXELS,
                16,
                [0x0000_00FF, 0, 0, 0x0000_FF00],
            ),
            Pitch::Row(width * 2),
        ),
        dxgi::A8_UNORM => (
            PixelFormat::masked(DDPF_ALPHA, 8, [0, 0, 0, 0x0000_00FF]),
            Pitch::Row(width),
        ),
        dxgi::R8_UNORM => (
            PixelFormat::masked(DDPF_LUMINANCE, 8, [0x0000_00FF, 0, 0, 0]),
            Pitch::Row(width),
        ),
        // anything the legacy header can't express is handed over through the extension
        _ => (PixelFormat::extended(), Pitch::Unknown),
    }
}

/// Writes `"DDS "`, the 124 byte header, and the 20 byte extension when the format requires it.
pub(crate) fn write_header(header: &DX10Header, out: &mut Vec<u8>) {
    use constants::{
        DDSCAPS2_CUBEMAP, DDSCAPS2_CUBEMAP_ALLFACES, DDSCAPS_COMPLEX, DDSCAPS_MIPMAP,
        DDSCAPS_TEXTURE, DDSD_CAPS, DDSD_HEIGHT, DDSD_LINEARSIZE, DDSD_MIPMAPCOUNT, DDSD_PITCH,
        DDSD_PIXELFORMAT, DDSD_WIDTH, DIMENSION_TEXTURE2D, HEADER_SIZE, MAGIC, MISC_TEXTURECUBE,
        PIXEL_FORMAT_SIZE,
    };

    let width = u32::from(header.width);
    let height = u32::from(header.height);
    let (pixel_format, pitch) = describe(header.format, width, height);

    let mut flags = DDSD_CAPS | DDSD_PIXELFORMAT | DDSD_WIDTH | DDSD_HEIGHT | DDSD_MIPMAPCOUNT;
    let pitch = match pitch {
        Pitch::Linear(x) => {
            flags |= DDSD_LINEARSIZE;
            x
        }
        Pitch::Row(x) => {
            flags |= DDSD_PITCH;
            x
        }
        Pitch::Unknown => 0,
    };

    let mut caps = DDSCAPS_TEXTURE;
    if header.mip_count > 1 {
        caps |= DDSCAPS_MIPMAP | DDSCAPS_COMPLEX;
    }

    let (caps2, misc_flags) = if header.is_cubemap() {
        caps |= DDSCAPS_COMPLEX;
        (DDSCAPS2_CUBEMAP | DDSCAPS2_CUBEMAP_ALLFACES, MISC_TEXTURECUBE)
    } else {
        (0, 0)
    };

    let mut put = |x: u32| out.extend_from_slice(&x.to_le_bytes());
    put(MAGIC);
    put(HEADER_SIZE);
    put(flags);
    put(height);
    put(width);
    put(pitch);
    put(0); // depth
    put(header.mip_count.into());
    for _ in 0..11 {
        put(0);
    }

    put(PIXEL_FORMAT_SIZE);
    put(pixel_format.flags);
    put(pixel_format.four_cc);
    put(pixel_format.bit_count);
    for mask in pixel_format.masks {
        put(mask);
    }

    put(caps);
    put(caps2);
    put(0);
    put(0);
    put(0);

    if pixel_format.is_extended() {
        put(header.format.into());
        put(DIMENSION_TEXTURE2D);
        put(misc_flags);
        put(1); // array size
        put(0);
    }
}
