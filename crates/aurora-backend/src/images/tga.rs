use super::{Image, ImageError, MipMap, PixelFormat};
use byteorder::{LittleEndian, WriteBytesExt};
use std::{fs, io::Write, path::Path};

const HEADER_SIZE: usize = 18;

fn write_header(out: &mut Vec<u8>, width: u16, height: u16) -> std::io::Result<()> {
    out.write_u8(0)?; // ID length
    out.write_u8(0)?; // palette size
    out.write_u8(2)?; // unmapped RGB
    out.write_u32::<LittleEndian>(0)?; // color map
    out.write_u8(0)?; // color map
    out.write_u16::<LittleEndian>(0)?; // x
    out.write_u16::<LittleEndian>(0)?; // y
    out.write_u16::<LittleEndian>(width)?;
    out.write_u16::<LittleEndian>(height)?;
    out.write_u8(32)?; // pixel depth
    out.write_u8(0)
}

fn write_mip_map(
    out: &mut Vec<u8>,
    mip_map: &MipMap,
    format: PixelFormat,
) -> Result<(), ImageError> {
    let bpp = match format {
        PixelFormat::Rgb | PixelFormat::Bgr => 3,
        PixelFormat::Rgba | PixelFormat::Bgra => 4,
        other => return Err(ImageError::UnsupportedPixelFormat(other)),
    };

    let expected = mip_map.width as usize * mip_map.height as usize * bpp;
    if mip_map.data.len() < expected {
        return Err(ImageError::Truncated {
            expected,
            actual: mip_map.data.len(),
        });
    }

    for p in mip_map.data[..expected].chunks_exact(bpp) {
        let bgra = match format {
            PixelFormat::Rgb => [p[2], p[1], p[0], 0xFF],
            PixelFormat::Bgr => [p[0], p[1], p[2], 0xFF],
            PixelFormat::Rgba => [p[2], p[1], p[0], p[3]],
            _ => [p[0], p[1], p[2], p[3]],
        };
        out.extend_from_slice(&bgra);
    }

    Ok(())
}

/// Encodes the top mip map of every layer, stacked vertically, as an
/// uncompressed 32-bit TGA.
pub fn encode_tga(image: &Image) -> Result<Vec<u8>, ImageError> {
    let first = image
        .layers
        .first()
        .and_then(|layer| layer.first())
        .ok_or(ImageError::NoImage)?;

    let width = first.width;
    let mut height = 0u32;
    for layer in image.layers.iter() {
        let mip_map = layer.first().ok_or(ImageError::NoImage)?;
        if mip_map.width != width {
            return Err(ImageError::VariableLayerWidth);
        }
        height += mip_map.height;
    }

    if width > u16::MAX as u32 || height > u16::MAX as u32 {
        return Err(ImageError::TooLarge { width, height });
    }

    let mut out = Vec::with_capacity(HEADER_SIZE + width as usize * height as usize * 4);
    write_header(&mut out, width as u16, height as u16)?;

    for layer in image.layers.iter() {
        if let Some(mip_map) = layer.first() {
            write_mip_map(&mut out, mip_map, image.format)?;
        }
    }

    Ok(out)
}

pub fn dump_tga<W: Write>(writer: &mut W, image: &Image) -> Result<(), ImageError> {
    let data = encode_tga(image)?;
    writer.write_all(&data)?;
    writer.flush()?;
    Ok(())
}

/// Writes `image` to `path`. Nothing is written when encoding fails.
pub fn dump_tga_file<P: AsRef<Path>>(path: P, image: &Image) -> Result<(), ImageError> {
    let data = encode_tga(image)?;
    fs::write(path, data)?;
    Ok(())
}
