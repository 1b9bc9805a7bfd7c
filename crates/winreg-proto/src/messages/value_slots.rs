//! The four in/out value pointers shared by `BaseRegQueryValue` and
//! `BaseRegEnumValue`.
//!
//! ```text
//! ptr -> u32 lpType
//! ptr -> conformant-varying u8 lpData   size_is(*lpcbData) length_is(*lpcbLen)
//! ptr -> u32 lpcbData                   buffer capacity / value size
//! ptr -> u32 lpcbLen                    bytes transmitted in lpData
//! ```

use crate::{
    errors::Result,
    ndr::{NdrReader, NdrWriter},
    types::ValueType,
};

/// Decoded contents of the four value pointers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct ValueSlots {
    pub value_type: Option<ValueType>,
    pub data: Option<Vec<u8>>,
    pub data_size: Option<u32>,
    pub data_len: Option<u32>,
}

impl ValueSlots {
    /// Request-side slots for a caller buffer of `capacity` bytes.
    ///
    /// The buffer is sent zero-filled with its full length transmitted, and
    /// omitted entirely when the capacity is zero.
    pub fn with_capacity(capacity: u32) -> Self {
        Self {
            value_type: Some(ValueType::None),
            data: (capacity != 0).then(|| vec![0; capacity as usize]),
            data_size: Some(capacity),
            data_len: Some(capacity),
        }
    }

    pub fn encode(&self, writer: &mut NdrWriter) -> Result<()> {
        writer.write_pointer(self.value_type.as_ref())?;
        writer.write_referent(self.data.is_some());
        if let Some(data) = &self.data {
            let max_count = self.data_size.unwrap_or_default();
            writer.write_varying_bytes(max_count, data)?;
        }
        writer.write_pointer(self.data_size.as_ref())?;
        writer.write_pointer(self.data_len.as_ref())
    }

    pub fn decode(reader: &mut NdrReader<'_>) -> Result<Self> {
        let value_type = reader.read_pointer()?;

        reader.align(4)?;
        let referent_offset = reader.position();
        let data = match reader.read_referent()? {
            Some(referent) => {
                reader.expect_referent_payload(referent_offset, referent)?;
                Some(reader.read_varying_bytes()?.1)
            },
            None => None,
        };

        let data_size = reader.read_pointer()?;
        let data_len = reader.read_pointer()?;
        Ok(Self { value_type, data, data_size, data_len })
    }

    /// Value bytes cut to the transmitted length.
    pub fn effective_data(data: Option<&[u8]>, data_len: Option<u32>) -> &[u8] {
        let data = data.unwrap_or_default();
        let len = data_len.map_or(data.len(), |len| (len as usize).min(data.len()));
        &data[..len]
    }
}
