//! `google/protobuf/duration.proto` and `timestamp.proto`: the two
//! well-known types the generator's emitted code references directly (e.g.
//! for RPC deadlines) without needing a full `.proto` import to resolve them.

use bytes::{Buf, BufMut};

use protokit::encoding::{self, DecodeContext, WireType};
use protokit::{DecodeError, Message};

/// Signed, fixed-length span of time, matching `google.protobuf.Duration`'s
/// seconds/nanos split.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Duration {
    pub seconds: i64,
    pub nanos: i32,
}

impl Message for Duration {
    fn encode_raw(&self, buf: &mut impl BufMut) {
        if self.seconds != 0 {
            encoding::int64::encode(1, &self.seconds, buf);
        }
        if self.nanos != 0 {
            encoding::int32::encode(2, &self.nanos, buf);
        }
    }

    fn merge_field(
        &mut self,
        tag: u32,
        wire_type: WireType,
        buf: &mut impl Buf,
        ctx: DecodeContext,
    ) -> Result<(), DecodeError> {
        match tag {
            1 => encoding::int64::merge(wire_type, &mut self.seconds, buf, ctx),
            2 => encoding::int32::merge(wire_type, &mut self.nanos, buf, ctx),
            _ => encoding::skip_field(wire_type, tag, buf, ctx),
        }
    }

    fn encoded_len(&self) -> usize {
        (if self.seconds != 0 {
            encoding::int64::encoded_len(1, &self.seconds)
        } else {
            0
        }) + (if self.nanos != 0 {
            encoding::int32::encoded_len(2, &self.nanos)
        } else {
            0
        })
    }

    fn clear(&mut self) {
        *self = Default::default();
    }
}

/// Point in time since the Unix epoch, matching `google.protobuf.Timestamp`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Timestamp {
    pub seconds: i64,
    pub nanos: i32,
}

impl Message for Timestamp {
    fn encode_raw(&self, buf: &mut impl BufMut) {
        if self.seconds != 0 {
            encoding::int64::encode(1, &self.seconds, buf);
        }
        if self.nanos != 0 {
            encoding::int32::encode(2, &self.nanos, buf);
        }
    }

    fn merge_field(
        &mut self,
        tag: u32,
        wire_type: WireType,
        buf: &mut impl Buf,
        ctx: DecodeContext,
    ) -> Result<(), DecodeError> {
        match tag {
            1 => encoding::int64::merge(wire_type, &mut self.seconds, buf, ctx),
            2 => encoding::int32::merge(wire_type, &mut self.nanos, buf, ctx),
            _ => encoding::skip_field(wire_type, tag, buf, ctx),
        }
    }

    fn encoded_len(&self) -> usize {
        (if self.seconds != 0 {
            encoding::int64::encoded_len(1, &self.seconds)
        } else {
            0
        }) + (if self.nanos != 0 {
            encoding::int32::encoded_len(2, &self.nanos)
        } else {
            0
        })
    }

    fn clear(&mut self) {
        *self = Default::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_valued_fields_are_omitted_from_the_wire() {
        let d = Duration::default();
        assert_eq!(d.encoded_len(), 0);
        assert!(d.encode_to_vec().is_empty());
    }

    #[test]
    fn round_trips_nonzero_seconds_and_nanos() {
        let ts = Timestamp {
            seconds: 1_700_000_000,
            nanos: 500,
        };
        let bytes = ts.encode_to_vec();
        assert_eq!(Timestamp::decode(&bytes[..]).unwrap(), ts);
    }
}
