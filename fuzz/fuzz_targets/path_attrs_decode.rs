#![no_main]

use bgpio::packet::message::{DecodeCxt, NotificationMsg, decode_path_attrs};
use bgpio_utils::arbitrary::BytesArbitrary;
use libfuzzer_sys::arbitrary::{Arbitrary, Unstructured};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut u = Unstructured::new(data);

    if let Ok(attr_len) = u16::arbitrary(&mut u)
        && let Ok(cxt) = DecodeCxt::arbitrary(&mut u)
        && let Ok(BytesArbitrary(mut buf)) =
            BytesArbitrary::arbitrary_take_rest(u)
    {
        let mut sink = Vec::new();
        let result = decode_path_attrs(&mut buf, attr_len, &cxt, &mut sink);
        if let Err(error) = result {
            let _ = NotificationMsg::from(error);
        }
    }
});
