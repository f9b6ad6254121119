mod attachment_cipher;

pub use attachment_cipher::{AesGcmAttachmentCipher, SealedAttachment, KEY_LEN, NONCE_LEN, TAG_LEN};
