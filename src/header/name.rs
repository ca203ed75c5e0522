use super::error::NameError;
use crate::read::Reader;
use crate::write::{WriteResult, Writer};
use log::warn;
use std::{
    borrow::Cow,
    io::{Read, Write},
};

/// Reads `count` null-terminated names from a name table of `table_size` bytes.
///
/// Names are matched to samples by position. A name cut short by the end of the table is kept as is,
/// and empty or missing names are replaced with `sample_{index}`.
pub(crate) fn read_names<R: Read>(
    reader: &mut Reader<R>,
    count: u32,
    table_size: u32,
) -> Result<Vec<Box<str>>, NameError> {
    let table = reader.take(table_size as usize).map_err(NameError::new)?;
    let mut remaining = table.as_slice();
    let mut names = Vec::new();

    for index in 0..count {
        // the terminator is consumed, but never part of the name
        let (raw, rest) = match remaining.iter().position(|&byte| byte == 0) {
            Some(end) => (&remaining[..end], &remaining[end + 1..]),
            None => (remaining, &[][..]),
        };
        remaining = rest;

        let name = match String::from_utf8_lossy(raw) {
            Cow::Borrowed("") => format!("sample_{index}").into_boxed_str(),
            Cow::Borrowed(name) => name.into(),
            Cow::Owned(name) => {
                warn!("name of sample at index {index} was not valid UTF-8: read as \"{name}\"");
                name.into_boxed_str()
            }
        };

        names.push(name);
    }

    Ok(names)
}

/// Size of the name table holding these names, terminators included.
pub(crate) fn table_size<'a>(names: impl IntoIterator<Item = &'a str>) -> usize {
    names.into_iter().map(|name| name.len() + 1).sum()
}

pub(crate) fn write_names<'a, W: Write>(
    writer: &mut Writer<W>,
    names: impl IntoIterator<Item = &'a str>,
) -> WriteResult<()> {
    for name in names {
        writer.bytes(name.as_bytes())?;
        writer.bytes(&[0])?;
    }

    Ok(())
}
