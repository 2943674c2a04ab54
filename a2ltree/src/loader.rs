use crate::A2lError;
use fnv::FnvHasher;
use std::fs::File;
use std::hash::Hasher;
use std::io::Read;
use std::path::Path;

/// The text encoding of a loaded file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Utf8,
    Utf16Le,
    Utf16Be,
    Utf32Le,
    Utf32Be,
    /// ISO 8859-1, used if the data is not valid in any of the unicode encodings
    Latin1,
}

pub(crate) fn load(path: &Path) -> Result<Vec<u8>, A2lError> {
    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(error) => {
            return Err(A2lError::FileOpenError {
                filename: path.to_path_buf(),
                ioerror: error,
            });
        }
    };

    read_data(&mut file, path)
}

fn read_data(file: &mut File, path: &Path) -> Result<Vec<u8>, A2lError> {
    let filesize = match file.metadata() {
        Ok(metadata) => metadata.len(),
        Err(err) => {
            return Err(A2lError::FileReadError {
                filename: path.to_path_buf(),
                ioerror: err,
            });
        }
    };
    let bufsize = usize::try_from(filesize).unwrap_or(usize::MAX);
    let mut buffer = Vec::with_capacity(bufsize);
    let read_result = file.read_to_end(&mut buffer);
    match read_result {
        Ok(_) => Ok(buffer),
        Err(err) => Err(A2lError::FileReadError {
            filename: path.to_path_buf(),
            ioerror: err,
        }),
    }
}

// content_digest()
// 64-bit FNV-1a hash of the raw data, as big endian bytes
pub(crate) fn content_digest(filedata: &[u8]) -> Vec<u8> {
    let mut hasher = FnvHasher::default();
    hasher.write(filedata);
    hasher.finish().to_be_bytes().to_vec()
}

// decode_raw_bytes()
// convert the file content to a string and report the encoding that was used.
// A byte order mark at the start of the data is removed
pub(crate) fn decode_raw_bytes(filedata: &[u8]) -> (String, Encoding) {
    let (text, encoding) = decode_with_bom(filedata);
    match text.strip_prefix('\u{feff}') {
        Some(stripped) => (stripped.to_string(), encoding),
        None => (text, encoding),
    }
}

fn decode_with_bom(filedata: &[u8]) -> (String, Encoding) {
    /* an a2l file must have either a BOM or a character from the basic ASCII set as the first character in the file
    we can use this to guess the encoding, because we expect to see nul-bytes in the first character if UTF-16 or UTF-32 is used. */

    /* check UTF-32.
     * Big endian format: the filedata should be 0x00 0x00 0xFE 0xFF if it is a BOM, or 00 00 00 xx otherwise.
     * Little endian format: The filedata should be 0xFF 0xFE 0x00 0x00 if it is a BOM, or xx 00 00 00 otherwise.*/
    if (filedata.len() % 4 == 0) && (filedata.len() > 3) {
        let u32conversion: Option<(fn([u8; 4]) -> u32, Encoding)> =
            if (filedata[0] == 0) && (filedata[1] == 0) && (filedata[3] != 0) {
                Some((u32::from_be_bytes, Encoding::Utf32Be))
            } else if (filedata[0] != 0) && (filedata[2] == 0) && (filedata[3] == 0) {
                Some((u32::from_le_bytes, Encoding::Utf32Le))
            } else {
                None
            };
        if let Some((conversion, encoding)) = u32conversion {
            let decoded: Option<String> = filedata
                .chunks_exact(4)
                .map(|charbytes| {
                    let charbytes = [charbytes[0], charbytes[1], charbytes[2], charbytes[3]];
                    std::char::from_u32(conversion(charbytes))
                })
                .collect();
            if let Some(text) = decoded {
                return (text, encoding);
            }
        }
    }

    /* check UTF-16
     * Big endian bom is 0xfe 0xff. Without BOM, the first character should be 0x00 0x??
     * little endian bom is 0xff 0xfe. Without BOM, the first character should be 0x?? 0x00 */
    if (filedata.len() % 2 == 0) && (filedata.len() > 1) {
        let u16conversion: Option<(fn([u8; 2]) -> u16, Encoding)> =
            if ((filedata[0] == 0) && (filedata[1] != 0))
                || (filedata[0] == 0xfe && filedata[1] == 0xff)
            {
                Some((u16::from_be_bytes, Encoding::Utf16Be))
            } else if ((filedata[0] != 0) && (filedata[1] == 0))
                || (filedata[0] == 0xff && filedata[1] == 0xfe)
            {
                Some((u16::from_le_bytes, Encoding::Utf16Le))
            } else {
                None
            };
        if let Some((conversion, encoding)) = u16conversion {
            let filedata_u16: Vec<u16> = filedata
                .chunks_exact(2)
                .map(|u16bytes| conversion([u16bytes[0], u16bytes[1]]))
                .collect();
            if let Ok(converted_u16) = String::from_utf16(&filedata_u16) {
                return (converted_u16, encoding);
            }
        }
    }

    /* try to handle the data as pure utf-8 */
    if let Ok(converted) = String::from_utf8(filedata.to_vec()) {
        return (converted, Encoding::Utf8);
    }

    /* handle the data as ISO8859-1. This always succeeds, because every sequence of bytes can be a latin-1 string */
    let outstr: String = filedata.iter().map(|ch| char::from(*ch)).collect();
    (outstr, Encoding::Latin1)
}

/*************************************************************************************************/
