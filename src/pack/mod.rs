pub(crate) mod descriptor;
