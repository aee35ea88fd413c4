use std::fmt::Display;

macro_rules! newtypes {
  {
    $( $(#[$meta:meta])* $Ident:ident: $ty:ty, )*
  } => {$(
    $(#[$meta])*
    #[derive(
      Debug, serde::Deserialize, serde::Serialize, sqlx::Type,
      Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
    )]
    #[serde(transparent)]
    #[sqlx(transparent)]
    pub struct $Ident(pub $ty);

    impl From<$ty> for $Ident {
      fn from(value: $ty) -> Self {
        Self(value)
      }
    }

    impl Display for $Ident {
      fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
      }
    }
  )*};
}

newtypes! {
  /// Primary key of the `users` table.
  UserId: i64,
  /// Primary key of the `connections` table.
  ConnectionId: i64,
}
