pub(crate) mod consts;
