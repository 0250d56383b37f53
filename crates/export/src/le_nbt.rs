//! Little-endian NBT writer for client payloads.
//!
//! Same tag layout as the on-disk flavour, but every multi-byte number
//! (including string and array lengths) is little-endian.

use std::io::{self, Write};

use byteorder::{LittleEndian, WriteBytesExt};
use quartz_nbt::{NbtCompound, NbtList, NbtTag};

const TAG_END: u8 = 0;

fn tag_id(tag: &NbtTag) -> u8 {
    match tag {
        NbtTag::Byte(_) => 1,
        NbtTag::Short(_) => 2,
        NbtTag::Int(_) => 3,
        NbtTag::Long(_) => 4,
        NbtTag::Float(_) => 5,
        NbtTag::Double(_) => 6,
        NbtTag::ByteArray(_) => 7,
        NbtTag::String(_) => 8,
        NbtTag::List(_) => 9,
        NbtTag::Compound(_) => 10,
        NbtTag::IntArray(_) => 11,
        NbtTag::LongArray(_) => 12,
    }
}

/// Writes `compound` as a named root tag.
pub fn write_root<W: Write>(out: &mut W, name: &str, compound: &NbtCompound) -> io::Result<()> {
    out.write_u8(10)?;
    write_string(out, name)?;
    write_compound(out, compound)
}

fn write_compound<W: Write>(out: &mut W, compound: &NbtCompound) -> io::Result<()> {
    for (name, tag) in compound.inner() {
        out.write_u8(tag_id(tag))?;
        write_string(out, name)?;
        write_payload(out, tag)?;
    }
    out.write_u8(TAG_END)
}

fn write_list<W: Write>(out: &mut W, list: &NbtList) -> io::Result<()> {
    let element = list.iter().next().map(tag_id).unwrap_or(TAG_END);
    out.write_u8(element)?;
    write_len(out, list.len())?;
    for tag in list.iter() {
        if tag_id(tag) != element {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "NBT list elements must share one tag type",
            ));
        }
        write_payload(out, tag)?;
    }
    Ok(())
}

fn write_payload<W: Write>(out: &mut W, tag: &NbtTag) -> io::Result<()> {
    match tag {
        NbtTag::Byte(v) => out.write_i8(*v),
        NbtTag::Short(v) => out.write_i16::<LittleEndian>(*v),
        NbtTag::Int(v) => out.write_i32::<LittleEndian>(*v),
        NbtTag::Long(v) => out.write_i64::<LittleEndian>(*v),
        NbtTag::Float(v) => out.write_f32::<LittleEndian>(*v),
        NbtTag::Double(v) => out.write_f64::<LittleEndian>(*v),
        NbtTag::ByteArray(v) => {
            write_len(out, v.len())?;
            v.iter().try_for_each(|b| out.write_i8(*b))
        }
        NbtTag::String(v) => write_string(out, v),
        NbtTag::List(v) => write_list(out, v),
        NbtTag::Compound(v) => write_compound(out, v),
        NbtTag::IntArray(v) => {
            write_len(out, v.len())?;
            v.iter().try_for_each(|i| out.write_i32::<LittleEndian>(*i))
        }
        NbtTag::LongArray(v) => {
            write_len(out, v.len())?;
            v.iter().try_for_each(|l| out.write_i64::<LittleEndian>(*l))
        }
    }
}

fn write_string<W: Write>(out: &mut W, s: &str) -> io::Result<()> {
    let len = u16::try_from(s.len()).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("NBT string of {} bytes exceeds u16 length", s.len()),
        )
    })?;
    out.write_u16::<LittleEndian>(len)?;
    out.write_all(s.as_bytes())
}

fn write_len<W: Write>(out: &mut W, len: usize) -> io::Result<()> {
    let len = i32::try_from(len)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "NBT array too long"))?;
    out.write_i32::<LittleEndian>(len)
}
