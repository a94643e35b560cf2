/// Declarative macro generating `Message`, `MessageKind`, the wire-name
/// helpers, domain groups and payload conversions from a single table.
///
/// # Sections
///
/// - **`messages`**: `Variant => "wire_name" => tag => PayloadType`. The tag
///   is the protobuf field number inside the envelope and must also appear in
///   the `tags` list of [`Envelope::message`](super::Envelope::message).
/// - **`domain_groups`**: named boolean methods on `MessageKind`.
macro_rules! define_messages {
    (
        messages {
            $(
                $(#[doc = $doc:literal])*
                $variant:ident => $wire:literal => $tag:tt => $payload:ty
            ),* $(,)?
        }
        domain_groups {
            $(
                $(#[doc = $gdoc:literal])*
                $method:ident => [$($gv:ident),* $(,)?]
            ),* $(,)?
        }
    ) => {
        // ── Message union ───────────────────────────────────────────

        /// Payload carried by an [`Envelope`](super::Envelope).
        ///
        /// In text form each variant is keyed by its wire name
        /// (e.g. `{"channel_join": {...}}`).
        #[derive(Clone, PartialEq, ::prost::Oneof, Serialize, Deserialize)]
        pub enum Message {
            $(
                $(#[doc = $doc])*
                #[prost(message, tag = $tag)]
                #[serde(rename = $wire)]
                $variant($payload),
            )*
        }

        // ── MessageKind enum ────────────────────────────────────────

        /// Discriminator naming each [`Message`] variant.
        #[derive(
            Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        pub enum MessageKind {
            $(
                $(#[doc = $doc])*
                #[serde(rename = $wire)]
                $variant,
            )*
        }

        impl MessageKind {
            /// Every kind in definition order.
            pub const ALL: [MessageKind; { [$($wire,)*].len() }] = [
                $(MessageKind::$variant,)*
            ];

            /// Wire name (e.g. `"channel_join"`).
            #[must_use]
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $wire,)*
                }
            }

            /// Look up a kind by wire name.
            #[must_use]
            pub fn from_wire(s: &str) -> Option<Self> {
                match s {
                    $($wire => Some(Self::$variant),)*
                    _ => None,
                }
            }

            // ── Domain group methods ────────────────────────────────

            $(
                $(#[doc = $gdoc])*
                #[must_use]
                pub fn $method(self) -> bool {
                    matches!(self, $(Self::$gv)|*)
                }
            )*
        }

        impl std::fmt::Display for MessageKind {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for MessageKind {
            type Err = CodecError;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                Self::from_wire(s).ok_or_else(|| CodecError::UnknownPayload(s.to_owned()))
            }
        }

        // ── Message helpers ─────────────────────────────────────────

        impl Message {
            /// Kind of this payload.
            #[must_use]
            pub fn kind(&self) -> MessageKind {
                match self {
                    $(Self::$variant(_) => MessageKind::$variant,)*
                }
            }
        }

        $(
            impl From<$payload> for Message {
                fn from(payload: $payload) -> Self {
                    Self::$variant(payload)
                }
            }
        )*
    };
}
